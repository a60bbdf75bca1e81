//! Monitored parameters and their admissible ranges.
//!
//! A [`ParameterRanges`] set is what parameterizes the classifier: either the
//! hardcoded defaults, or the bounds of the active plant profile.

use serde::Serialize;

use crate::RangeProfile;

// ---

/// Scale applied to a profile's nitrogen bounds to obtain mg/kg alert bounds.
pub const NITROGEN_ALERT_SCALE: f64 = 5.0;

/// Scale applied to a profile's phosphorus and potassium bounds.
pub const PHOSPHORUS_ALERT_SCALE: f64 = 8.0;
pub const POTASSIUM_ALERT_SCALE: f64 = 8.0;

/// A monitored sensor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Temperature,
    Humidity,
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Parameter {
    /// Every parameter, in display order.
    pub const ALL: [Parameter; 6] = [
        Parameter::Temperature,
        Parameter::Humidity,
        Parameter::Ph,
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
    ];

    /// Human-readable (Spanish) name used in alert messages and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperatura",
            Parameter::Humidity => "Humedad",
            Parameter::Ph => "pH",
            Parameter::Nitrogen => "Nitrógeno",
            Parameter::Phosphorus => "Fósforo",
            Parameter::Potassium => "Potasio",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature => "°C",
            Parameter::Humidity => "%",
            Parameter::Ph => "",
            Parameter::Nitrogen | Parameter::Phosphorus | Parameter::Potassium => " mg/kg",
        }
    }
}

/// Admissible `[min, max]` bounds plus the optimum for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

impl ParameterRange {
    /// Build a range, defaulting the optimum to the midpoint when absent.
    pub fn new(min: f64, max: f64, optimal: Option<f64>) -> Self {
        // ---
        Self {
            min,
            max,
            optimal: optimal.unwrap_or((min + max) / 2.0),
        }
    }

    /// Strictly outside `[min, max]`.
    pub fn is_out_of_range(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            min: self.min * factor,
            max: self.max * factor,
            optimal: self.optimal * factor,
        }
    }
}

/// One range per monitored parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRanges {
    pub temperature: ParameterRange,
    pub humidity: ParameterRange,
    pub ph: ParameterRange,
    pub nitrogen: ParameterRange,
    pub phosphorus: ParameterRange,
    pub potassium: ParameterRange,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            temperature: ParameterRange::new(18.0, 28.0, Some(23.0)),
            humidity: ParameterRange::new(40.0, 80.0, Some(60.0)),
            ph: ParameterRange::new(6.0, 7.5, None),
            nitrogen: ParameterRange::new(20.0, 40.0, None),
            phosphorus: ParameterRange::new(15.0, 30.0, None),
            potassium: ParameterRange::new(100.0, 200.0, None),
        }
    }
}

impl ParameterRanges {
    /// Ranges derived from a plant profile.
    ///
    /// Temperature, humidity and pH are taken as-is. Nutrient bounds are
    /// scaled into mg/kg alert bounds; a nutrient without bounds in the
    /// profile keeps the default range.
    pub fn from_profile(profile: &RangeProfile) -> Self {
        // ---
        let defaults = Self::default();

        let nutrient = |min: Option<f64>,
                        max: Option<f64>,
                        opt: Option<f64>,
                        scale: f64,
                        fallback: ParameterRange| match (min, max) {
            (Some(min), Some(max)) => ParameterRange::new(min, max, opt).scaled(scale),
            _ => fallback,
        };

        Self {
            temperature: ParameterRange::new(
                profile.temperature_min,
                profile.temperature_max,
                profile.temperature_optimal,
            ),
            humidity: ParameterRange::new(
                profile.humidity_min,
                profile.humidity_max,
                profile.humidity_optimal,
            ),
            ph: ParameterRange::new(profile.ph_min, profile.ph_max, profile.ph_optimal),
            nitrogen: nutrient(
                profile.nitrogen_min,
                profile.nitrogen_max,
                profile.nitrogen_optimal,
                NITROGEN_ALERT_SCALE,
                defaults.nitrogen,
            ),
            phosphorus: nutrient(
                profile.phosphorus_min,
                profile.phosphorus_max,
                profile.phosphorus_optimal,
                PHOSPHORUS_ALERT_SCALE,
                defaults.phosphorus,
            ),
            potassium: nutrient(
                profile.potassium_min,
                profile.potassium_max,
                profile.potassium_optimal,
                POTASSIUM_ALERT_SCALE,
                defaults.potassium,
            ),
        }
    }

    pub fn get(&self, parameter: Parameter) -> ParameterRange {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Humidity => self.humidity,
            Parameter::Ph => self.ph,
            Parameter::Nitrogen => self.nitrogen,
            Parameter::Phosphorus => self.phosphorus,
            Parameter::Potassium => self.potassium,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::tests::create_test_profile;

    #[test]
    fn test_optimal_defaults_to_midpoint() {
        // ---
        let range = ParameterRange::new(10.0, 30.0, None);
        assert_eq!(range.optimal, 20.0);

        let explicit = ParameterRange::new(10.0, 30.0, Some(12.0));
        assert_eq!(explicit.optimal, 12.0);
    }

    #[test]
    fn test_out_of_range_is_strict() {
        // ---
        let range = ParameterRange::new(10.0, 30.0, None);
        assert!(!range.is_out_of_range(10.0));
        assert!(!range.is_out_of_range(30.0));
        assert!(range.is_out_of_range(9.99));
        assert!(range.is_out_of_range(30.01));
    }

    #[test]
    fn test_profile_nutrients_are_scaled() {
        // ---
        let profile = create_test_profile(1, "Tomate");
        let ranges = ParameterRanges::from_profile(&profile);

        // nitrogen 4..8 % -> x5
        assert_eq!(ranges.nitrogen.min, 20.0);
        assert_eq!(ranges.nitrogen.max, 40.0);
        assert_eq!(ranges.nitrogen.optimal, 30.0);

        // phosphorus 2..4 % -> x8
        assert_eq!(ranges.phosphorus.min, 16.0);
        assert_eq!(ranges.phosphorus.max, 32.0);

        // potassium 15..25 % -> x8
        assert_eq!(ranges.potassium.min, 120.0);
        assert_eq!(ranges.potassium.max, 200.0);
    }

    #[test]
    fn test_profile_environment_ranges_are_taken_as_is() {
        // ---
        let profile = create_test_profile(1, "Tomate");
        let ranges = ParameterRanges::from_profile(&profile);

        assert_eq!(ranges.temperature, ParameterRange::new(20.0, 26.0, Some(23.0)));
        assert_eq!(ranges.humidity, ParameterRange::new(50.0, 70.0, None));
        assert_eq!(ranges.ph, ParameterRange::new(6.0, 7.0, Some(6.5)));
    }

    #[test]
    fn test_missing_nutrient_bounds_fall_back_to_defaults() {
        // ---
        let mut profile = create_test_profile(1, "Lechuga");
        profile.potassium_min = None;
        profile.potassium_max = None;

        let ranges = ParameterRanges::from_profile(&profile);
        assert_eq!(ranges.potassium, ParameterRanges::default().potassium);
    }
}
