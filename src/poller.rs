//! Cancellable periodic task.
//!
//! [`PollHandle::start`] spawns a loop that runs a tick immediately and then
//! once per period until [`PollHandle::stop`] is called. A tick that overruns
//! its period causes the missed ticks to be skipped, not replayed.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

// ---

#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Spawn the polling loop. `tick` is awaited to completion before the
    /// next tick is considered; it reports its own failures.
    pub fn start<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // ---
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::debug!("Poller started (period {:?})", period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => tick().await,
                }
            }
            tracing::debug!("Poller stopped");
        });

        Self { cancel, task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the loop and wait for it to finish. A tick in flight is
    /// allowed to complete.
    pub async fn stop(self) {
        // ---
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("Poller task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_poller(period: Duration, work: Duration) -> (PollHandle, Arc<AtomicUsize>) {
        // ---
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = PollHandle::start(period, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if !work.is_zero() {
                    tokio::time::sleep(work).await;
                }
            }
        });
        (handle, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        // ---
        let (handle, count) = counting_poller(Duration::from_secs(30), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_the_period() {
        // ---
        let (handle, count) = counting_poller(Duration::from_secs(30), Duration::ZERO);

        // ticks at 0s, 30s and 60s
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_the_loop() {
        // ---
        let (handle, count) = counting_poller(Duration::from_secs(30), Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert!(handle.is_running());
        handle.stop().await;

        let seen = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ticks_skip_missed_periods() {
        // ---
        // each tick takes 70s against a 30s period
        let (handle, count) = counting_poller(Duration::from_secs(30), Duration::from_secs(70));

        // the tick at 0s runs until 70s; the missed ticks at 30s and 60s
        // collapse into one that starts at 70s and runs until 140s
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        handle.stop().await;
    }
}
