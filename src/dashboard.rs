//! Dashboard session state.
//!
//! A thin holder for the active profile, the latest reading and the alerts
//! derived from it. Derived state is recomputed from scratch on every input
//! change; nothing is patched in place.

use serde::Serialize;
use thiserror::Error;

use crate::classifier::{classify_reading, generate_alerts, Alert, ParameterStatus};
use crate::ranges::ParameterRanges;
use crate::{RangeProfile, Reading};

// ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("plant profile {0} is inactive and cannot be selected")]
    InactiveProfile(i64),
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    active_profile: Option<RangeProfile>,
    ranges: ParameterRanges,
    latest: Option<Reading>,
    alerts: Vec<Alert>,
    irrigation_active: bool,
}

/// Serializable view of the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub active_profile: Option<RangeProfile>,
    pub ranges: ParameterRanges,
    pub latest: Option<Reading>,
    pub parameters: Vec<ParameterStatus>,
    pub alerts: Vec<Alert>,
    pub irrigation_active: bool,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_profile(&self) -> Option<&RangeProfile> {
        self.active_profile.as_ref()
    }

    pub fn ranges(&self) -> &ParameterRanges {
        &self.ranges
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.latest.as_ref()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn irrigation_active(&self) -> bool {
        self.irrigation_active
    }

    /// Make `profile` the active selection, or clear it with `None`.
    ///
    /// Ranges switch to the profile's bounds (defaults when cleared) and the
    /// current alerts are dropped; they are recomputed on the next reading.
    pub fn select_profile(&mut self, profile: Option<RangeProfile>) -> Result<(), SelectionError> {
        // ---
        if let Some(p) = &profile {
            if !p.active {
                return Err(SelectionError::InactiveProfile(p.id));
            }
        }

        self.ranges = profile
            .as_ref()
            .map_or_else(ParameterRanges::default, ParameterRanges::from_profile);
        self.active_profile = profile;
        self.alerts.clear();
        Ok(())
    }

    /// Take in an edited profile. If it is the active one, the selection
    /// follows the edit; a deactivated active profile is deselected.
    ///
    /// Returns true when the active selection changed.
    pub fn profile_updated(&mut self, profile: &RangeProfile) -> bool {
        // ---
        let is_active = self
            .active_profile
            .as_ref()
            .is_some_and(|p| p.id == profile.id);
        if !is_active {
            return false;
        }

        let next = profile.active.then(|| profile.clone());
        // An inactive profile maps to None, so this cannot fail.
        let _ = self.select_profile(next);
        true
    }

    /// Forget the active selection if it is the profile with `id`.
    pub fn profile_removed(&mut self, id: i64) -> bool {
        // ---
        if self.active_profile.as_ref().is_some_and(|p| p.id == id) {
            let _ = self.select_profile(None);
            true
        } else {
            false
        }
    }

    /// Record a new reading and recompute its alerts against the current
    /// ranges. Previous alerts are replaced, never accumulated.
    pub fn on_reading(&mut self, reading: Reading) -> &[Alert] {
        // ---
        self.alerts = generate_alerts(&reading, &self.ranges);
        self.latest = Some(reading);
        &self.alerts
    }

    pub fn toggle_irrigation(&mut self) -> bool {
        self.irrigation_active = !self.irrigation_active;
        self.irrigation_active
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        // ---
        DashboardSnapshot {
            active_profile: self.active_profile.clone(),
            ranges: self.ranges,
            latest: self.latest.clone(),
            parameters: classify_reading(self.latest.as_ref(), &self.ranges),
            alerts: self.alerts.clone(),
            irrigation_active: self.irrigation_active,
        }
    }
}
