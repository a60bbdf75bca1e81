//! Historical report generation.
//!
//! Gateway for the report modules: callers hand over a window of readings
//! and a renderer and get back the analysis plus the path of the written
//! document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::Reading;

mod analysis;
mod document;
mod pdf;
mod recommendations;

pub use analysis::{
    aggregate, overall_status, Analysis, Condition, NutrientThresholds, OverallStatus,
    ParameterStats,
};
pub use document::{
    file_name, layout, Page, ReportContext, ReportDocument, ReportRenderer, TextRenderer,
};
pub use pdf::PdfRenderer;
pub use recommendations::{recommend, Priority, Recommendation};

// ---

/// Output format of report files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Pdf,
    Text,
}

impl ReportFormat {
    /// `pdf` or `txt`, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(ReportFormat::Pdf),
            "txt" | "text" => Some(ReportFormat::Text),
            _ => None,
        }
    }
}

/// What a report run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub file: PathBuf,
    pub generated_on: NaiveDate,
    pub reading_count: usize,
    pub pages: usize,
    pub overall_status: OverallStatus,
    pub analysis: Analysis,
    pub recommendations: Vec<Recommendation>,
}

/// Analyse `readings`, lay the report out and write it into `out_dir`.
///
/// One file per call, named after `generated_on`; a second report on the
/// same day replaces the first.
pub async fn write_report(
    readings: &[Reading],
    renderer: &(impl ReportRenderer + Sync),
    out_dir: &Path,
    generated_on: NaiveDate,
) -> Result<ReportSummary> {
    // ---
    let analysis = aggregate(readings);
    let recommendations = recommend(&analysis);

    let document = layout(&ReportContext {
        readings,
        analysis: &analysis,
        recommendations: &recommendations,
        generated_on,
    });
    let bytes = renderer.render(&document);

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create report directory {}", out_dir.display()))?;

    let file = out_dir.join(file_name(generated_on, renderer.extension()));
    tokio::fs::write(&file, bytes)
        .await
        .with_context(|| format!("Failed to write report {}", file.display()))?;

    tracing::info!(
        "Report written to {} ({} readings, {} pages)",
        file.display(),
        readings.len(),
        document.pages.len()
    );

    Ok(ReportSummary {
        file,
        generated_on,
        reading_count: readings.len(),
        pages: document.pages.len(),
        overall_status: overall_status(&analysis),
        analysis,
        recommendations,
    })
}
