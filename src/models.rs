//! Data models shared between the backend client, the dashboard and the
//! local HTTP API.
//!
//! Wire names follow the SMIIVERN backend (Spanish camelCase for profiles and
//! users, snake_case for sensor readings); Rust field names are English.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::policy::Role;
use crate::ranges::Parameter;

// ---

/// How a numeric wire field arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
enum WireNumber {
    Absent,
    Number(f64),
    /// Present, but not a finite number.
    Unreadable,
}

impl WireNumber {
    fn from_json(value: Option<serde_json::Value>) -> Self {
        // ---
        let parsed = match value {
            None | Some(serde_json::Value::Null) => return WireNumber::Absent,
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => return WireNumber::Absent,
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match parsed.filter(|v| v.is_finite()) {
            Some(v) => WireNumber::Number(v),
            None => WireNumber::Unreadable,
        }
    }

    fn value(self) -> Option<f64> {
        match self {
            WireNumber::Number(v) => Some(v),
            _ => None,
        }
    }
}

/// Accept a number, a decimal string or `null`. Anything that does not parse
/// to a finite number is treated as "not measured".
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    // ---
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(WireNumber::from_json(value).value())
}

/// Like [`lenient_f64`] but the field must be present and numeric.
fn required_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_f64(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a number or numeric string"))
}

fn default_true() -> bool {
    true
}

/// One timestamped sensor snapshot. Absent fields were not measured this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireReading")]
pub struct Reading {
    // ---
    pub id: Option<i64>,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub conductivity: Option<f64>,
    pub tds: Option<f64>,
    pub n: Option<f64>,
    pub p: Option<f64>,
    pub k: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    /// Nutrients the device sent but that did not parse as numbers.
    #[serde(skip)]
    pub unreadable: Vec<Parameter>,
}

/// A reading as the backend sends it. Nutrients stay raw until the
/// conversion can tell a null apart from garbage.
#[derive(Deserialize)]
struct WireReading {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    device_id: String,
    timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_f64")]
    temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    ph: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    conductivity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    tds: Option<f64>,
    #[serde(default)]
    n: Option<serde_json::Value>,
    #[serde(default)]
    p: Option<serde_json::Value>,
    #[serde(default)]
    k: Option<serde_json::Value>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<WireReading> for Reading {
    fn from(wire: WireReading) -> Self {
        // ---
        let mut unreadable = Vec::new();
        let mut nutrient = |parameter: Parameter, raw: Option<serde_json::Value>| {
            let number = WireNumber::from_json(raw);
            if number == WireNumber::Unreadable {
                unreadable.push(parameter);
            }
            number.value()
        };
        let n = nutrient(Parameter::Nitrogen, wire.n);
        let p = nutrient(Parameter::Phosphorus, wire.p);
        let k = nutrient(Parameter::Potassium, wire.k);

        Reading {
            id: wire.id,
            device_id: wire.device_id,
            timestamp: wire.timestamp,
            temperature: wire.temperature,
            humidity: wire.humidity,
            ph: wire.ph,
            conductivity: wire.conductivity,
            tds: wire.tds,
            n,
            p,
            k,
            created_at: wire.created_at,
            unreadable,
        }
    }
}

impl Reading {
    /// The measured value for a parameter, if any.
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Temperature => self.temperature,
            Parameter::Humidity => self.humidity,
            Parameter::Ph => self.ph,
            Parameter::Nitrogen => self.n,
            Parameter::Phosphorus => self.p,
            Parameter::Potassium => self.k,
        }
    }
}

/// A named set of acceptable/optimal bounds per parameter ("perfil de planta").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeProfile {
    // ---
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tipoPlanta", default, skip_serializing_if = "Option::is_none")]
    pub plant_type: Option<String>,

    #[serde(rename = "temperaturaMin", deserialize_with = "required_f64")]
    pub temperature_min: f64,
    #[serde(rename = "temperaturaMax", deserialize_with = "required_f64")]
    pub temperature_max: f64,
    #[serde(rename = "temperaturaOptima", default, deserialize_with = "lenient_f64")]
    pub temperature_optimal: Option<f64>,

    #[serde(rename = "humedadMin", deserialize_with = "required_f64")]
    pub humidity_min: f64,
    #[serde(rename = "humedadMax", deserialize_with = "required_f64")]
    pub humidity_max: f64,
    #[serde(rename = "humedadOptima", default, deserialize_with = "lenient_f64")]
    pub humidity_optimal: Option<f64>,

    #[serde(rename = "phMin", deserialize_with = "required_f64")]
    pub ph_min: f64,
    #[serde(rename = "phMax", deserialize_with = "required_f64")]
    pub ph_max: f64,
    #[serde(rename = "phOptimo", default, deserialize_with = "lenient_f64")]
    pub ph_optimal: Option<f64>,

    #[serde(rename = "nitrogenoMin", default, deserialize_with = "lenient_f64")]
    pub nitrogen_min: Option<f64>,
    #[serde(rename = "nitrogenoMax", default, deserialize_with = "lenient_f64")]
    pub nitrogen_max: Option<f64>,
    #[serde(rename = "nitrogenoOptimo", default, deserialize_with = "lenient_f64")]
    pub nitrogen_optimal: Option<f64>,

    #[serde(rename = "fosforoMin", default, deserialize_with = "lenient_f64")]
    pub phosphorus_min: Option<f64>,
    #[serde(rename = "fosforoMax", default, deserialize_with = "lenient_f64")]
    pub phosphorus_max: Option<f64>,
    #[serde(rename = "fosforoOptimo", default, deserialize_with = "lenient_f64")]
    pub phosphorus_optimal: Option<f64>,

    #[serde(rename = "potasioMin", default, deserialize_with = "lenient_f64")]
    pub potassium_min: Option<f64>,
    #[serde(rename = "potasioMax", default, deserialize_with = "lenient_f64")]
    pub potassium_max: Option<f64>,
    #[serde(rename = "potasioOptimo", default, deserialize_with = "lenient_f64")]
    pub potassium_optimal: Option<f64>,

    #[serde(rename = "luzMin", default, deserialize_with = "lenient_f64")]
    pub light_min: Option<f64>,
    #[serde(rename = "luzMax", default, deserialize_with = "lenient_f64")]
    pub light_max: Option<f64>,
    #[serde(rename = "horasLuzDiarias", default, deserialize_with = "lenient_f64")]
    pub daily_light_hours: Option<f64>,
    #[serde(rename = "diasGerminacion", default)]
    pub germination_days: Option<u32>,
    #[serde(rename = "diasCosecha", default)]
    pub harvest_days: Option<u32>,

    /// Soft-delete flag; inactive profiles cannot be selected.
    #[serde(rename = "activo", default = "default_true")]
    pub active: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Whether a draft is for a new profile or a partial edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Update,
}

/// Profile form rules that a draft violated.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid plant profile: {}", .0.join("; "))]
pub struct ProfileValidationError(pub Vec<String>);

/// Body of a profile create (POST) or partial update (PATCH).
///
/// Absent fields are left out of the serialized body so a PATCH only touches
/// what the user edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    // ---
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "tipoPlanta", default, skip_serializing_if = "Option::is_none")]
    pub plant_type: Option<String>,

    #[serde(rename = "temperaturaMin", default, skip_serializing_if = "Option::is_none")]
    pub temperature_min: Option<f64>,
    #[serde(rename = "temperaturaMax", default, skip_serializing_if = "Option::is_none")]
    pub temperature_max: Option<f64>,
    #[serde(rename = "temperaturaOptima", default, skip_serializing_if = "Option::is_none")]
    pub temperature_optimal: Option<f64>,

    #[serde(rename = "humedadMin", default, skip_serializing_if = "Option::is_none")]
    pub humidity_min: Option<f64>,
    #[serde(rename = "humedadMax", default, skip_serializing_if = "Option::is_none")]
    pub humidity_max: Option<f64>,
    #[serde(rename = "humedadOptima", default, skip_serializing_if = "Option::is_none")]
    pub humidity_optimal: Option<f64>,

    #[serde(rename = "phMin", default, skip_serializing_if = "Option::is_none")]
    pub ph_min: Option<f64>,
    #[serde(rename = "phMax", default, skip_serializing_if = "Option::is_none")]
    pub ph_max: Option<f64>,
    #[serde(rename = "phOptimo", default, skip_serializing_if = "Option::is_none")]
    pub ph_optimal: Option<f64>,

    #[serde(rename = "nitrogenoMin", default, skip_serializing_if = "Option::is_none")]
    pub nitrogen_min: Option<f64>,
    #[serde(rename = "nitrogenoMax", default, skip_serializing_if = "Option::is_none")]
    pub nitrogen_max: Option<f64>,
    #[serde(rename = "nitrogenoOptimo", default, skip_serializing_if = "Option::is_none")]
    pub nitrogen_optimal: Option<f64>,

    #[serde(rename = "fosforoMin", default, skip_serializing_if = "Option::is_none")]
    pub phosphorus_min: Option<f64>,
    #[serde(rename = "fosforoMax", default, skip_serializing_if = "Option::is_none")]
    pub phosphorus_max: Option<f64>,
    #[serde(rename = "fosforoOptimo", default, skip_serializing_if = "Option::is_none")]
    pub phosphorus_optimal: Option<f64>,

    #[serde(rename = "potasioMin", default, skip_serializing_if = "Option::is_none")]
    pub potassium_min: Option<f64>,
    #[serde(rename = "potasioMax", default, skip_serializing_if = "Option::is_none")]
    pub potassium_max: Option<f64>,
    #[serde(rename = "potasioOptimo", default, skip_serializing_if = "Option::is_none")]
    pub potassium_optimal: Option<f64>,

    #[serde(rename = "activo", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Form limits for one parameter, with the draft values they apply to.
struct BoundRule {
    field: &'static str,
    lower: f64,
    upper: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    optimal: Option<f64>,
    range_message: &'static str,
}

impl ProfileDraft {
    /// Check the draft against the profile form rules.
    ///
    /// On create, the name and the temperature/humidity/pH bounds are
    /// required. Bounds must lie within each parameter's physical limits and
    /// `min <= max` wherever both are given.
    pub fn validate(&self, mode: DraftMode) -> Result<(), ProfileValidationError> {
        // ---
        let mut errors = Vec::new();

        match self.name.as_deref().map(str::trim) {
            Some("") => errors.push("El nombre es obligatorio".to_string()),
            None if mode == DraftMode::Create => {
                errors.push("El nombre es obligatorio".to_string())
            }
            Some(name) if name.chars().count() > 100 => {
                errors.push("El nombre no puede superar los 100 caracteres".to_string())
            }
            _ => {}
        }

        if mode == DraftMode::Create {
            let required = [
                ("temperaturaMin", self.temperature_min),
                ("temperaturaMax", self.temperature_max),
                ("humedadMin", self.humidity_min),
                ("humedadMax", self.humidity_max),
                ("phMin", self.ph_min),
                ("phMax", self.ph_max),
            ];
            for (field, value) in required {
                if value.is_none() {
                    errors.push(format!("{field} es obligatorio"));
                }
            }
        }

        for rule in self.bound_rules() {
            for (suffix, value) in [("Min", rule.min), ("Max", rule.max), ("Optimo", rule.optimal)] {
                let Some(value) = value else { continue };
                let below = value < rule.lower;
                let above = rule.upper.is_some_and(|upper| value > upper);
                if below || above {
                    errors.push(match rule.upper {
                        Some(upper) => format!(
                            "{}{suffix} debe estar entre {} y {}",
                            rule.field, rule.lower, upper
                        ),
                        None => format!("{}{suffix} no puede ser negativo", rule.field),
                    });
                }
            }
            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                if min > max {
                    errors.push(rule.range_message.to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProfileValidationError(errors))
        }
    }

    /// The draft laid over a stored profile: edited fields win, the rest come
    /// from `current`. Used to check a partial edit against the bounds it
    /// leaves untouched.
    pub fn over(&self, current: &RangeProfile) -> ProfileDraft {
        // ---
        ProfileDraft {
            name: self.name.clone(),
            description: self.description.clone().or_else(|| current.description.clone()),
            plant_type: self.plant_type.clone().or_else(|| current.plant_type.clone()),
            temperature_min: self.temperature_min.or(Some(current.temperature_min)),
            temperature_max: self.temperature_max.or(Some(current.temperature_max)),
            temperature_optimal: self.temperature_optimal.or(current.temperature_optimal),
            humidity_min: self.humidity_min.or(Some(current.humidity_min)),
            humidity_max: self.humidity_max.or(Some(current.humidity_max)),
            humidity_optimal: self.humidity_optimal.or(current.humidity_optimal),
            ph_min: self.ph_min.or(Some(current.ph_min)),
            ph_max: self.ph_max.or(Some(current.ph_max)),
            ph_optimal: self.ph_optimal.or(current.ph_optimal),
            nitrogen_min: self.nitrogen_min.or(current.nitrogen_min),
            nitrogen_max: self.nitrogen_max.or(current.nitrogen_max),
            nitrogen_optimal: self.nitrogen_optimal.or(current.nitrogen_optimal),
            phosphorus_min: self.phosphorus_min.or(current.phosphorus_min),
            phosphorus_max: self.phosphorus_max.or(current.phosphorus_max),
            phosphorus_optimal: self.phosphorus_optimal.or(current.phosphorus_optimal),
            potassium_min: self.potassium_min.or(current.potassium_min),
            potassium_max: self.potassium_max.or(current.potassium_max),
            potassium_optimal: self.potassium_optimal.or(current.potassium_optimal),
            active: self.active.or(Some(current.active)),
        }
    }

    fn bound_rules(&self) -> [BoundRule; 6] {
        [
            BoundRule {
                field: "temperatura",
                lower: -50.0,
                upper: Some(100.0),
                min: self.temperature_min,
                max: self.temperature_max,
                optimal: self.temperature_optimal,
                range_message: "La temperatura mínima no puede ser mayor que la máxima",
            },
            BoundRule {
                field: "humedad",
                lower: 0.0,
                upper: Some(100.0),
                min: self.humidity_min,
                max: self.humidity_max,
                optimal: self.humidity_optimal,
                range_message: "La humedad mínima no puede ser mayor que la máxima",
            },
            BoundRule {
                field: "ph",
                lower: 0.0,
                upper: Some(14.0),
                min: self.ph_min,
                max: self.ph_max,
                optimal: self.ph_optimal,
                range_message: "El pH mínimo no puede ser mayor que el máximo",
            },
            BoundRule {
                field: "nitrogeno",
                lower: 0.0,
                upper: None,
                min: self.nitrogen_min,
                max: self.nitrogen_max,
                optimal: self.nitrogen_optimal,
                range_message: "El nitrógeno mínimo no puede ser mayor que el máximo",
            },
            BoundRule {
                field: "fosforo",
                lower: 0.0,
                upper: None,
                min: self.phosphorus_min,
                max: self.phosphorus_max,
                optimal: self.phosphorus_optimal,
                range_message: "El fósforo mínimo no puede ser mayor que el máximo",
            },
            BoundRule {
                field: "potasio",
                lower: 0.0,
                upper: None,
                min: self.potassium_min,
                max: self.potassium_max,
                optimal: self.potassium_optimal,
                range_message: "El potasio mínimo no puede ser mayor que el máximo",
            },
        ]
    }
}

/// Credentials posted to `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Successful login: bearer token plus the user it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserInfo,
}

/// Body posted to `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "tipoUsuario")]
    pub user_type: String,
}

/// The logged-in user, as returned by login and persisted with the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "tipoUsuario")]
    pub user_type: String,
}

impl UserInfo {
    /// The user's role, `None` for an unknown user type.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.user_type)
    }
}

/// A user account as listed on the configuration screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "tipoUsuario")]
    pub user_type: String,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "fechaCreacion", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "fechaActualizacion", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Envelope used by the backend's `/users` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// UI colour scheme, persisted between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than `"dark"` reads as light.
    pub fn parse(value: &str) -> Self {
        if value == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
