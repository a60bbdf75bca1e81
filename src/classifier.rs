//! Threshold classification of live readings.
//!
//! Two independent policies live here:
//! - [`classify`] gives the three-tier status shown next to each gauge.
//! - [`check_alert`] decides whether a value raises an [`Alert`], which only
//!   happens strictly outside `[min, max]`.
//!
//! A value can be inside its range yet classified `Warning` (far from the
//! optimum) without raising an alert.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ranges::{Parameter, ParameterRange, ParameterRanges};
use crate::Reading;

// ---

/// Width of the optimal band, as a fraction of the optimum.
pub const OPTIMAL_TOLERANCE: f64 = 0.15;

/// Status tier for one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Optimal,
    Warning,
    Danger,
}

/// Classify a value against a range.
///
/// Within `optimal ± 15%` is `Optimal`; otherwise outside `[min, max]` is
/// `Danger`; anything else is `Warning`. With an optimum of zero the band has
/// zero width and only an exact zero is `Optimal`.
pub fn classify(value: f64, range: &ParameterRange) -> Severity {
    // ---
    let tolerance = (range.optimal * OPTIMAL_TOLERANCE).abs();

    if value >= range.optimal - tolerance && value <= range.optimal + tolerance {
        Severity::Optimal
    } else if range.is_out_of_range(value) {
        Severity::Danger
    } else {
        Severity::Warning
    }
}

/// A parameter strictly outside its admissible range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub parameter: Parameter,
    pub severity: Severity,
    pub message: String,
    pub value: f64,
    pub range: ParameterRange,
    pub timestamp: DateTime<Utc>,
}

/// Raise an alert when `value` is below `min` or above `max`.
pub fn check_alert(
    parameter: Parameter,
    value: f64,
    range: &ParameterRange,
    timestamp: DateTime<Utc>,
) -> Option<Alert> {
    // ---
    let unit = parameter.unit();
    let bound = if value < range.min {
        format!("por debajo del mínimo ({:.1}{unit})", range.min)
    } else if value > range.max {
        format!("por encima del máximo ({:.1}{unit})", range.max)
    } else {
        return None;
    };

    Some(Alert {
        parameter,
        severity: Severity::Danger,
        message: format!("{}: {value:.1}{unit} {bound}", parameter.label()),
        value,
        range: *range,
        timestamp,
    })
}

/// All alerts for one reading. Unmeasured parameters are skipped.
pub fn generate_alerts(reading: &Reading, ranges: &ParameterRanges) -> Vec<Alert> {
    // ---
    Parameter::ALL
        .iter()
        .filter_map(|&parameter| {
            let value = reading.value(parameter)?;
            check_alert(parameter, value, &ranges.get(parameter), reading.timestamp)
        })
        .collect()
}

/// Status of one parameter of the latest reading, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterStatus {
    pub parameter: Parameter,
    pub value: Option<f64>,
    pub range: ParameterRange,
    pub severity: Option<Severity>,
}

/// Per-parameter status of a reading; `severity` is `None` when not measured.
pub fn classify_reading(reading: Option<&Reading>, ranges: &ParameterRanges) -> Vec<ParameterStatus> {
    // ---
    Parameter::ALL
        .iter()
        .map(|&parameter| {
            let range = ranges.get(parameter);
            let value = reading.and_then(|r| r.value(parameter));
            ParameterStatus {
                parameter,
                value,
                range,
                severity: value.map(|v| classify(v, &range)),
            }
        })
        .collect()
}
