//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification and the
//! payloads and helpers shared by every page view.

use crate::web::state::AppState;
use crate::web::{battles, competitors, designer, designs, home, insights, styles};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use design_studio_core::analytics::{self, BarCap, BarLayout, BarRow, Ranked};
use design_studio_core::ports::{ErrorKind, PortError, Row, Table};
use design_studio_core::Report;
use serde::Serialize;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        home::home_handler,
        insights::options_handler,
        insights::trends_handler,
        competitors::analysis_handler,
        competitors::browse_handler,
        competitors::brands_handler,
        battles::competitors_handler,
        battles::compare_handler,
        battles::compare_pdf_handler,
        styles::options_handler,
        styles::image_prompt_handler,
        styles::refine_prompt_handler,
        styles::generate_handler,
        styles::latest_handler,
        styles::stage_report_handler,
        styles::launch_plan_handler,
        styles::save_handler,
        designer::list_insights_handler,
        designer::add_insight_handler,
        designs::list_designs_handler,
    ),
    components(
        schemas(BarRowView, AiInsightView)
    ),
    tags(
        (name = "Design Studio API", description = "Trend analytics, competitor research and AI-assisted braid design.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// Error half of every handler result.
pub type HandlerError = (StatusCode, String);

/// One table row with its text bar.
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct BarRowView {
    pub label: String,
    pub value: f64,
    /// The value and its bar, e.g. `"████ 20"`.
    pub display: String,
}

impl From<BarRow> for BarRowView {
    fn from(row: BarRow) -> Self {
        Self {
            label: row.label,
            value: row.value,
            display: row.display,
        }
    }
}

pub fn bar_rows(rows: &[Ranked], cap: BarCap, layout: BarLayout) -> Vec<BarRowView> {
    analytics::bar_table(rows, cap, layout)
        .into_iter()
        .map(BarRowView::from)
        .collect()
}

/// A short generated remark that can be added to the designer insights.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct AiInsightView {
    pub context: String,
    pub text: String,
    pub failed: bool,
}

/// Asks the pipeline for a remark on `summary`. Failures degrade to a readable placeholder.
pub async fn ai_insight(state: &AppState, context: &str, summary: &str) -> AiInsightView {
    let block = state.pipeline.remark(context, summary).await;
    AiInsightView {
        context: context.to_string(),
        text: block.display_text("insights"),
        failed: block.is_failed(),
    }
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Maps a port error onto the status a view answers with.
pub fn port_error(e: PortError) -> HandlerError {
    let status = match e.kind() {
        ErrorKind::MissingColumn | ErrorKind::Encoding => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NoImage | ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

/// Reads a table for a view.
///
/// A failed read degrades to an empty table and a notice for the caller to
/// show. A missing column halts the view.
pub async fn load_rows(
    state: &AppState,
    table: Table,
    columns: Option<&[&str]>,
    notices: &mut Vec<String>,
) -> Result<Vec<Row>, HandlerError> {
    match state.store.select(table, columns).await {
        Ok(rows) => Ok(rows),
        Err(e @ PortError::MissingColumn(_)) => {
            error!("View halted, {} is missing a column: {}", table.name(), e);
            Err(port_error(e))
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", table.name(), e);
            notices.push(format!("Error fetching {}: {}", table.name(), e.cause()));
            Ok(Vec::new())
        }
    }
}

/// A string safe to use as a download file name.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "design".to_string()
    } else {
        stem
    }
}

/// Renders `report` and wraps it as a file download.
pub fn pdf_download(state: &AppState, report: &Report, file_name: &str) -> Result<Response, HandlerError> {
    let bytes = state.renderer.render(report).map_err(|e| {
        error!("Failed to export '{}': {}", report.title, e);
        port_error(e)
    })?;
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
