pub mod battles;
pub mod competitors;
pub mod designer;
pub mod designs;
pub mod home;
pub mod insights;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod styles;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use state::AppState;

/// Builds the dashboard router. Every route runs inside a studio session.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home::home_handler))
        .route("/insights", get(insights::trends_handler))
        .route("/insights/options", get(insights::options_handler))
        .route("/competitors/analysis", post(competitors::analysis_handler))
        .route("/competitors/browse", post(competitors::browse_handler))
        .route("/competitors/brands", get(competitors::brands_handler))
        .route("/battles/competitors", get(battles::competitors_handler))
        .route("/battles/compare", post(battles::compare_handler))
        .route("/battles/compare/pdf", post(battles::compare_pdf_handler))
        .route("/styles/options", get(styles::options_handler))
        .route(
            "/styles/prompt",
            post(styles::image_prompt_handler).put(styles::refine_prompt_handler),
        )
        .route("/styles/generate", post(styles::generate_handler))
        .route("/styles/latest", get(styles::latest_handler))
        .route("/styles/report", get(styles::launch_plan_handler))
        .route("/styles/report/{stage}", get(styles::stage_report_handler))
        .route("/styles/save", post(styles::save_handler))
        .route(
            "/designer/insights",
            get(designer::list_insights_handler).post(designer::add_insight_handler),
        )
        .route("/designs", get(designs::list_designs_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::attach_session,
        ))
        .with_state(state)
}
