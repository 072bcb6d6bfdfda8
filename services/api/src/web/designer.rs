//! services/api/src/web/designer.rs
//!
//! The designer insight list every page adds to.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use design_studio_core::insights::{self, InsightAdded};
use design_studio_core::ports::DataStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::rest::HandlerError;
use crate::web::state::{AppState, SharedSession};

#[derive(Deserialize, ToSchema)]
pub struct AddInsightRequest {
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AddInsightResponse {
    /// `false` when the insight was already kept in this session.
    pub added: bool,
    /// `false` when the store write failed; the insight stays in the session regardless.
    pub mirrored: bool,
    pub message: String,
    pub insights: Vec<String>,
}

/// Records `text` in the session and mirrors it to the insights table when it
/// is new. The session lock is released before the store write.
pub async fn keep_insight(session: &SharedSession, store: &dyn DataStore, text: &str) -> InsightAdded {
    let added = session.lock().await.insights.record(text);
    if !added {
        info!("Insight already kept in this session.");
        return InsightAdded::duplicate();
    }
    insights::mirror(text, store).await
}

async fn insight_texts(session: &SharedSession) -> Vec<String> {
    let session = session.lock().await;
    session.insights.list().iter().map(|i| i.to_string()).collect()
}

/// The insights kept in this session, oldest first.
#[utoipa::path(
    get,
    path = "/designer/insights",
    responses((status = 200, description = "Session insights", body = InsightsResponse))
)]
pub async fn list_insights_handler(Extension(session): Extension<SharedSession>) -> impl IntoResponse {
    Json(InsightsResponse {
        insights: insight_texts(&session).await,
    })
}

/// Keeps an insight and mirrors it to the insights table.
#[utoipa::path(
    post,
    path = "/designer/insights",
    request_body = AddInsightRequest,
    responses(
        (status = 200, description = "Outcome of the addition", body = AddInsightResponse),
        (status = 400, description = "Empty insight")
    )
)]
pub async fn add_insight_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SharedSession>,
    Json(request): Json<AddInsightRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if request.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Insight text is empty.".to_string()));
    }

    let outcome = keep_insight(&session, state.store.as_ref(), &request.text).await;
    let message = match (&outcome.added, &outcome.persisted) {
        (false, _) => "Insight already saved.".to_string(),
        (true, Some(Err(e))) => format!("Insight added, but saving it failed: {}", e.cause()),
        (true, _) => "Insight added to designer.".to_string(),
    };

    Ok(Json(AddInsightResponse {
        added: outcome.added,
        mirrored: matches!(outcome.persisted, Some(Ok(()))),
        message,
        insights: insight_texts(&session).await,
    }))
}
