//! Aggregate statistics over a window of historical readings.

use serde::{Serialize, Serializer};

use crate::ranges::Parameter;
use crate::Reading;

// ---

/// Qualitative band for an averaged parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NoData,
    VeryCold,
    Cold,
    Optimal,
    Hot,
    VeryHot,
    VeryDry,
    Dry,
    Humid,
    VeryHumid,
    VeryAcidic,
    Acidic,
    Alkaline,
    VeryAlkaline,
    Deficient,
    Adequate,
    Excessive,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::NoData => "no data",
            Condition::VeryCold => "very cold",
            Condition::Cold => "cold",
            Condition::Optimal => "optimal",
            Condition::Hot => "hot",
            Condition::VeryHot => "very hot",
            Condition::VeryDry => "very dry",
            Condition::Dry => "dry",
            Condition::Humid => "humid",
            Condition::VeryHumid => "very humid",
            Condition::VeryAcidic => "very acidic",
            Condition::Acidic => "acidic",
            Condition::Alkaline => "alkaline",
            Condition::VeryAlkaline => "very alkaline",
            Condition::Deficient => "deficient",
            Condition::Adequate => "adequate",
            Condition::Excessive => "excessive",
        }
    }

    /// Label printed in the Spanish report document.
    pub fn display_label(&self) -> &'static str {
        match self {
            Condition::NoData => "Sin datos",
            Condition::VeryCold => "Muy Frío",
            Condition::Cold => "Frío",
            Condition::Optimal => "Óptimo",
            Condition::Hot => "Caluroso",
            Condition::VeryHot => "Muy Caluroso",
            Condition::VeryDry => "Muy Seco",
            Condition::Dry => "Seco",
            Condition::Humid => "Húmedo",
            Condition::VeryHumid => "Muy Húmedo",
            Condition::VeryAcidic => "Muy Ácido",
            Condition::Acidic => "Ácido",
            Condition::Alkaline => "Alcalino",
            Condition::VeryAlkaline => "Muy Alcalino",
            Condition::Deficient => "Deficiente",
            Condition::Adequate => "Adecuado",
            Condition::Excessive => "Excesivo",
        }
    }

    /// One of the "very ..." extremes.
    pub fn is_extreme(&self) -> bool {
        self.label().contains("very")
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Temperature band (°C).
pub fn temperature_condition(value: f64) -> Condition {
    if value < 15.0 {
        Condition::VeryCold
    } else if value < 20.0 {
        Condition::Cold
    } else if value <= 25.0 {
        Condition::Optimal
    } else if value <= 30.0 {
        Condition::Hot
    } else {
        Condition::VeryHot
    }
}

/// Relative humidity band (%).
pub fn humidity_condition(value: f64) -> Condition {
    if value < 30.0 {
        Condition::VeryDry
    } else if value < 50.0 {
        Condition::Dry
    } else if value <= 70.0 {
        Condition::Optimal
    } else if value <= 85.0 {
        Condition::Humid
    } else {
        Condition::VeryHumid
    }
}

pub fn ph_condition(value: f64) -> Condition {
    if value < 6.0 {
        Condition::VeryAcidic
    } else if value < 6.5 {
        Condition::Acidic
    } else if value <= 7.5 {
        Condition::Optimal
    } else if value <= 8.0 {
        Condition::Alkaline
    } else {
        Condition::VeryAlkaline
    }
}

/// Deficient/adequate/excessive breakpoints for a nutrient (mg/kg).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientThresholds {
    pub low: f64,
    pub high: f64,
}

pub const NITROGEN_THRESHOLDS: NutrientThresholds = NutrientThresholds { low: 20.0, high: 40.0 };
pub const PHOSPHORUS_THRESHOLDS: NutrientThresholds = NutrientThresholds { low: 15.0, high: 30.0 };
pub const POTASSIUM_THRESHOLDS: NutrientThresholds = NutrientThresholds { low: 100.0, high: 200.0 };

pub fn nutrient_condition(value: f64, thresholds: NutrientThresholds) -> Condition {
    if value < thresholds.low {
        Condition::Deficient
    } else if value <= thresholds.high {
        Condition::Adequate
    } else {
        Condition::Excessive
    }
}

/// Average, extremes and band of one parameter over the analysed window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub status: Condition,
}

impl ParameterStats {
    const NO_DATA: ParameterStats = ParameterStats {
        average: 0.0,
        min: 0.0,
        max: 0.0,
        status: Condition::NoData,
    };

    fn from_values(values: &[f64], band: impl Fn(f64) -> Condition) -> Self {
        // ---
        if values.is_empty() {
            return Self::NO_DATA;
        }
        let average = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            average,
            min,
            max,
            status: band(average),
        }
    }
}

/// Per-parameter statistics for a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Analysis {
    /// Readings that had temperature, humidity and pH.
    pub valid_readings: usize,
    pub temperature: ParameterStats,
    pub humidity: ParameterStats,
    pub ph: ParameterStats,
    pub nitrogen: ParameterStats,
    pub phosphorus: ParameterStats,
    pub potassium: ParameterStats,
}

impl Analysis {
    /// Every statistic zero, every status "no data".
    pub fn no_data() -> Self {
        Self {
            valid_readings: 0,
            temperature: ParameterStats::NO_DATA,
            humidity: ParameterStats::NO_DATA,
            ph: ParameterStats::NO_DATA,
            nitrogen: ParameterStats::NO_DATA,
            phosphorus: ParameterStats::NO_DATA,
            potassium: ParameterStats::NO_DATA,
        }
    }

    pub fn has_data(&self) -> bool {
        self.valid_readings > 0
    }
}

/// Aggregate a window of readings.
///
/// Only readings with temperature, humidity and pH all present count. Within
/// those, a missing N, P or K value counts as a zero reading rather than
/// being skipped; one that was sent but did not parse is skipped.
pub fn aggregate(readings: &[Reading]) -> Analysis {
    // ---
    let valid: Vec<&Reading> = readings
        .iter()
        .filter(|r| r.temperature.is_some() && r.humidity.is_some() && r.ph.is_some())
        .collect();

    if valid.is_empty() {
        return Analysis::no_data();
    }

    let measured = |field: fn(&Reading) -> Option<f64>| -> Vec<f64> {
        valid.iter().filter_map(|r| field(r)).collect()
    };
    let nutrient = |parameter: Parameter| -> Vec<f64> {
        valid
            .iter()
            .filter(|r| !r.unreadable.contains(&parameter))
            .map(|r| r.value(parameter).unwrap_or(0.0))
            .collect()
    };

    Analysis {
        valid_readings: valid.len(),
        temperature: ParameterStats::from_values(&measured(|r| r.temperature), temperature_condition),
        humidity: ParameterStats::from_values(&measured(|r| r.humidity), humidity_condition),
        ph: ParameterStats::from_values(&measured(|r| r.ph), ph_condition),
        nitrogen: ParameterStats::from_values(&nutrient(Parameter::Nitrogen), |v| {
            nutrient_condition(v, NITROGEN_THRESHOLDS)
        }),
        phosphorus: ParameterStats::from_values(&nutrient(Parameter::Phosphorus), |v| {
            nutrient_condition(v, PHOSPHORUS_THRESHOLDS)
        }),
        potassium: ParameterStats::from_values(&nutrient(Parameter::Potassium), |v| {
            nutrient_condition(v, POTASSIUM_THRESHOLDS)
        }),
    }
}

/// Summary line status for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Good,
    NeedsAttention,
    Acceptable,
}

impl OverallStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::Good => "Bueno",
            OverallStatus::NeedsAttention => "Requiere Atención",
            OverallStatus::Acceptable => "Aceptable",
        }
    }
}

impl Serialize for OverallStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// "Bueno" if temperature, humidity or pH is optimal; otherwise "Requiere
/// Atención" if any of them is an extreme; otherwise "Aceptable".
///
/// The optimal check runs first, so one optimal parameter masks an extreme
/// one.
pub fn overall_status(analysis: &Analysis) -> OverallStatus {
    // ---
    let statuses = [
        analysis.temperature.status,
        analysis.humidity.status,
        analysis.ph.status,
    ];

    if statuses.contains(&Condition::Optimal) {
        OverallStatus::Good
    } else if statuses.iter().any(Condition::is_extreme) {
        OverallStatus::NeedsAttention
    } else {
        OverallStatus::Acceptable
    }
}
