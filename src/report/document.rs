//! Paginated layout of a report and the renderer seam.
//!
//! [`layout`] turns the analysis into pages of text lines; a
//! [`ReportRenderer`] turns those pages into file bytes.

use chrono::NaiveDate;

use super::analysis::{overall_status, Analysis, ParameterStats};
use super::recommendations::Recommendation;
use crate::Reading;

// ---

/// Body lines per page, footer excluded.
pub const LINES_PER_PAGE: usize = 48;

/// Readings tabulated in the detailed data section.
pub const TABLE_ROWS: usize = 20;

const RULE: &str = "══════════════════════════════════════════════════════════════════════════";

/// Everything a report is built from.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub readings: &'a [Reading],
    pub analysis: &'a Analysis,
    pub recommendations: &'a [Recommendation],
    pub generated_on: NaiveDate,
}

/// One page: body lines plus its footer.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub body: Vec<String>,
    pub footer: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub pages: Vec<Page>,
    pub generated_on: NaiveDate,
}

/// Turns a laid-out document into the bytes of a report file.
pub trait ReportRenderer {
    /// File extension, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, document: &ReportDocument) -> Vec<u8>;
}

/// Plain UTF-8 text, pages separated by a form feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, document: &ReportDocument) -> Vec<u8> {
        // ---
        let pages: Vec<String> = document
            .pages
            .iter()
            .map(|page| {
                let mut text = page.body.join("\n");
                text.push_str("\n\n");
                text.push_str(&page.footer.join("\n"));
                text.push('\n');
                text
            })
            .collect();
        pages.join("\u{c}\n").into_bytes()
    }
}

/// `reporte-smiivern-YYYY-MM-DD.<ext>`
pub fn file_name(date: NaiveDate, extension: &str) -> String {
    format!("reporte-smiivern-{}.{extension}", date.format("%Y-%m-%d"))
}

/// Calendar date the way the dashboard shows it (`26/3/2025`).
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}

/// Lay out the report: header, executive summary, detailed analysis, data
/// table and recommendations. A section that does not fit in what is left of
/// a page starts on a new one; sections longer than a page are split.
pub fn layout(ctx: &ReportContext<'_>) -> ReportDocument {
    // ---
    let sections = [
        header(),
        executive_summary(ctx),
        detailed_analysis(ctx.analysis),
        data_table(ctx.readings),
        recommendations(ctx.recommendations),
    ];

    let mut pages: Vec<Vec<String>> = vec![Vec::new()];
    for section in sections {
        let used = pages.last().map_or(0, Vec::len);
        if used > 0 && used + section.len() > LINES_PER_PAGE && section.len() <= LINES_PER_PAGE {
            pages.push(Vec::new());
        }
        for line in section {
            if pages.last().map_or(0, Vec::len) >= LINES_PER_PAGE {
                pages.push(Vec::new());
            }
            if let Some(page) = pages.last_mut() {
                page.push(line);
            }
        }
    }

    let total = pages.len();
    let date = display_date(ctx.generated_on);
    let pages = pages
        .into_iter()
        .enumerate()
        .map(|(i, body)| Page {
            body,
            footer: vec![
                "─".repeat(74),
                "SMIIVERN - Sistema de Monitoreo Inteligente para Cultivos".to_string(),
                format!("Página {} de {total}", i + 1),
                format!("Generado el {date}"),
            ],
        })
        .collect();

    ReportDocument {
        pages,
        generated_on: ctx.generated_on,
    }
}

fn header() -> Vec<String> {
    vec![
        RULE.to_string(),
        "SMIIVERN".to_string(),
        "Sistema de Monitoreo Inteligente".to_string(),
        "Reporte de Análisis de Cultivos".to_string(),
        RULE.to_string(),
        String::new(),
    ]
}

fn executive_summary(ctx: &ReportContext<'_>) -> Vec<String> {
    vec![
        "RESUMEN EJECUTIVO".to_string(),
        String::new(),
        format!(
            "  Este reporte presenta el análisis de {} mediciones de sensores.",
            ctx.readings.len()
        ),
        format!(
            "  Estado general del cultivo: {}",
            overall_status(ctx.analysis).label()
        ),
        format!("  Fecha de generación: {}", display_date(ctx.generated_on)),
        "  Parámetros monitoreados: Temperatura, Humedad, pH y Nutrientes (N-P-K)".to_string(),
        String::new(),
    ]
}

fn range_line(stats: &ParameterStats, unit: &str) -> String {
    format!("    Rango: {:.1}{unit} - {:.1}{unit}", stats.min, stats.max)
}

fn detailed_analysis(analysis: &Analysis) -> Vec<String> {
    // ---
    let t = &analysis.temperature;
    let h = &analysis.humidity;
    let ph = &analysis.ph;

    vec![
        "ANÁLISIS DETALLADO".to_string(),
        String::new(),
        "  Condiciones Ambientales".to_string(),
        format!("    Temperatura: {:.1}°C ({})", t.average, t.status.display_label()),
        range_line(t, "°C"),
        format!("    Humedad: {:.1}% ({})", h.average, h.status.display_label()),
        range_line(h, "%"),
        String::new(),
        "  Análisis de Suelo".to_string(),
        format!("    pH: {:.1} ({})", ph.average, ph.status.display_label()),
        range_line(ph, ""),
        String::new(),
        "  Nutrientes".to_string(),
        format!(
            "    Nitrógeno (N): {:.0} mg/kg ({})",
            analysis.nitrogen.average,
            analysis.nitrogen.status.display_label()
        ),
        format!(
            "    Fósforo (P): {:.0} mg/kg ({})",
            analysis.phosphorus.average,
            analysis.phosphorus.status.display_label()
        ),
        format!(
            "    Potasio (K): {:.0} mg/kg ({})",
            analysis.potassium.average,
            analysis.potassium.status.display_label()
        ),
        String::new(),
    ]
}

fn cell(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}{unit}"),
        None => "N/A".to_string(),
    }
}

fn data_table(readings: &[Reading]) -> Vec<String> {
    // ---
    let mut lines = vec![
        "DATOS DETALLADOS".to_string(),
        String::new(),
        format!(
            "{:<11}{:>11}{:>13}{:>7}{:>11}{:>11}{:>11}",
            "Fecha", "Temp (°C)", "Humedad (%)", "pH", "N (mg/kg)", "P (mg/kg)", "K (mg/kg)"
        ),
    ];

    for r in readings.iter().take(TABLE_ROWS) {
        lines.push(format!(
            "{:<11}{:>11}{:>13}{:>7}{:>11}{:>11}{:>11}",
            display_date(r.timestamp.date_naive()),
            cell(r.temperature, 1, "°C"),
            cell(r.humidity, 1, "%"),
            cell(r.ph, 1, ""),
            cell(r.n, 0, ""),
            cell(r.p, 0, ""),
            cell(r.k, 0, ""),
        ));
    }
    lines.push(String::new());
    lines
}

fn recommendations(recs: &[Recommendation]) -> Vec<String> {
    // ---
    let mut lines = vec!["RECOMENDACIONES".to_string(), String::new()];

    if recs.is_empty() {
        lines.push("  No se identificaron áreas de mejora. Condiciones óptimas.".to_string());
        return lines;
    }

    for (i, rec) in recs.iter().enumerate() {
        lines.push(format!("  {}. {} [{}]", i + 1, rec.title, rec.priority.label()));
        lines.push(format!("     {}", rec.description));
        lines.push(String::new());
    }
    lines
}
