//! Report generation over the device's reading history.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Local;

use super::error::{authorize, ApiError};
use crate::policy::Action;
use crate::report::{
    aggregate, write_report, PdfRenderer, ReportFormat, ReportSummary, TextRenderer,
};
use crate::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/reports", post(generate))
}

/// Fetch the history, analyse it and write the report file.
///
/// Without a single valid reading no file is written and 422 is returned.
async fn generate(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ReportSummary>), ApiError> {
    // ---
    authorize(&state, Action::AccessReports).await?;

    let readings = state.history().await;
    if !aggregate(&readings).has_data() {
        tracing::info!("Report skipped: no valid readings among {}", readings.len());
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No hay datos suficientes para generar el reporte",
        ));
    }

    let today = Local::now().date_naive();
    let out_dir = &state.config.report_dir;
    let summary = match state.config.report_format {
        ReportFormat::Pdf => write_report(&readings, &PdfRenderer, out_dir, today).await,
        ReportFormat::Text => write_report(&readings, &TextRenderer, out_dir, today).await,
    }
    .map_err(|e| ApiError::internal(format!("{e:#}")))?;

    Ok((StatusCode::CREATED, Json(summary)))
}
