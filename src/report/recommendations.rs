//! Rule-based recommendations derived from an [`Analysis`].

use serde::{Serialize, Serializer};

use super::analysis::{Analysis, Condition};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Media",
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: Priority,
}

const fn rec(title: &'static str, description: &'static str, priority: Priority) -> Recommendation {
    Recommendation {
        title,
        description,
        priority,
    }
}

/// Run every rule in fixed order: temperature, humidity, pH, then N, P, K.
///
/// Rules are independent; an empty list means conditions are optimal.
pub fn recommend(analysis: &Analysis) -> Vec<Recommendation> {
    // ---
    let mut out = Vec::new();

    let temperature = analysis.temperature.average;
    if temperature < 18.0 {
        out.push(rec(
            "Incrementar temperatura",
            "Considere implementar sistemas de calefacción o invernaderos para mejorar las condiciones térmicas.",
            Priority::High,
        ));
    } else if temperature > 28.0 {
        out.push(rec(
            "Reducir temperatura",
            "Implemente sistemas de ventilación o sombreado para reducir el estrés térmico de los cultivos.",
            Priority::High,
        ));
    }

    let humidity = analysis.humidity.average;
    if humidity < 40.0 {
        out.push(rec(
            "Aumentar humedad",
            "Incremente la frecuencia de riego o instale sistemas de nebulización.",
            Priority::Medium,
        ));
    } else if humidity > 80.0 {
        out.push(rec(
            "Controlar humedad",
            "Mejore la ventilación para prevenir enfermedades fúngicas.",
            Priority::Medium,
        ));
    }

    let ph = analysis.ph.average;
    if ph < 6.0 {
        out.push(rec(
            "Ajustar pH del suelo",
            "Aplique cal agrícola para neutralizar la acidez del suelo.",
            Priority::High,
        ));
    } else if ph > 8.0 {
        out.push(rec(
            "Reducir alcalinidad",
            "Aplique azufre elemental o sulfato de hierro para reducir el pH.",
            Priority::High,
        ));
    }

    if analysis.nitrogen.status == Condition::Deficient {
        out.push(rec(
            "Fertilización nitrogenada",
            "Aplique fertilizantes ricos en nitrógeno como urea o nitrato de amonio.",
            Priority::High,
        ));
    }
    if analysis.phosphorus.status == Condition::Deficient {
        out.push(rec(
            "Suplementar fósforo",
            "Utilice superfosfato simple o fosfato diamónico.",
            Priority::Medium,
        ));
    }
    if analysis.potassium.status == Condition::Deficient {
        out.push(rec(
            "Añadir potasio",
            "Aplique cloruro o sulfato de potasio según las necesidades del cultivo.",
            Priority::Medium,
        ));
    }

    out
}
