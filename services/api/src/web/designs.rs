//! services/api/src/web/designs.rs
//!
//! My Designs: what has been saved to the store, across sessions.

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use design_studio_core::ports::{Row, Table};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::rest::{load_rows, HandlerError};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DesignsResponse {
    /// Rows of the saved-design table as stored.
    #[schema(value_type = Vec<Object>)]
    pub designs: Vec<Row>,
    /// Rows of the designer insights table as stored.
    #[schema(value_type = Vec<Object>)]
    pub insights: Vec<Row>,
    pub notices: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/designs",
    responses(
        (status = 200, description = "Saved designs and insights", body = DesignsResponse)
    )
)]
pub async fn list_designs_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, HandlerError> {
    let mut notices = Vec::new();
    let designs = load_rows(&state, Table::Designs, None, &mut notices).await?;
    let insights = load_rows(&state, Table::DesignerInsights, None, &mut notices).await?;
    if designs.is_empty() && notices.is_empty() {
        notices.push("No designs saved yet.".to_string());
    }
    Ok(Json(DesignsResponse {
        designs,
        insights,
        notices,
    }))
}
