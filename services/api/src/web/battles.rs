//! services/api/src/web/battles.rs
//!
//! Head-to-head competitor comparison: static brand profiles, a feature table
//! and a generated market comparison that can be exported as a PDF.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use design_studio_core::report;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::rest::{ai_insight, pdf_download, AiInsightView, HandlerError};
use crate::web::state::AppState;

pub const DEFAULT_PAIR: (&str, &str) = ("Outre", "Darling");
const COMPARISON_FILE: &str = "Competitor_Comparison.pdf";

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct CompetitorProfile {
    pub name: String,
    pub description: String,
    pub strengths: Vec<String>,
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub feature: String,
    pub first: String,
    pub second: String,
}

#[derive(Serialize, ToSchema)]
pub struct CompetitorsResponse {
    pub competitors: Vec<CompetitorProfile>,
    pub default_first: String,
    pub default_second: String,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct CompareRequest {
    pub first: String,
    pub second: String,
}

#[derive(Serialize, ToSchema)]
pub struct CompareResponse {
    pub first: CompetitorProfile,
    pub second: CompetitorProfile,
    pub features: Vec<FeatureRow>,
    pub ai_insight: AiInsightView,
}

fn profile(name: &str, description: &str, strengths: [&str; 3]) -> CompetitorProfile {
    CompetitorProfile {
        name: name.to_string(),
        description: description.to_string(),
        strengths: strengths.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn profiles() -> Vec<CompetitorProfile> {
    vec![
        profile(
            "Outre",
            "A premium hair brand specializing in synthetic & human hair braids, wigs, and extensions.",
            ["High-Quality Fibers", "Trend-Driven Styles", "Strong Social Media Presence"],
        ),
        profile(
            "Darling",
            "A mass-market synthetic hair brand focusing on affordability and accessibility in emerging markets.",
            ["Budget-Friendly", "High Availability in Africa", "Everyday Wear"],
        ),
        profile(
            "Sensationnel",
            "A well-established hair brand known for premium wigs, weaves, and braided hair extensions.",
            ["Lace Wig Innovations", "Luxury Hair Blends", "Diverse Hair Textures"],
        ),
        profile(
            "X-Pression",
            "A brand known for ultra-lightweight synthetic braiding hair with superior volume.",
            ["Ultra-Light Fibers", "Long-Length Braids", "Popular in Professional Styling"],
        ),
    ]
}

fn find_profile(name: &str) -> Result<CompetitorProfile, HandlerError> {
    profiles()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Unknown competitor: {}", name)))
}

/// The feature table. Columns hold the same values whichever pair is shown.
pub fn feature_table() -> Vec<FeatureRow> {
    [
        ("Product Type", "Synthetic & Human Hair Braids", "Synthetic Braids"),
        ("Target Market", "Global (U.S., Africa, EU)", "Africa & Emerging Markets"),
        ("Price Range", "Mid-High", "Budget-Friendly"),
        (
            "Color Variety",
            "Extensive (Ombré, Balayage, Bright Colors)",
            "Basic Shades (Natural Black, Brown)",
        ),
        ("Durability", "Long-Lasting Fibers", "Moderate Durability"),
        ("Innovative Features", "Pre-Stretched, HD Lace, Melted Hairline", "Limited Innovations"),
        ("Social Media Presence", "High (Influencers, Ads)", "Low (Minimal Digital Ads)"),
        ("Retail Presence", "Strong Online & Offline", "Beauty Supply Stores"),
    ]
    .into_iter()
    .map(|(feature, first, second)| FeatureRow {
        feature: feature.to_string(),
        first: first.to_string(),
        second: second.to_string(),
    })
    .collect()
}

fn comparison_prompt(first: &str, second: &str) -> (String, String) {
    (
        format!("{} vs. {} Hair Market Analysis", first, second),
        format!(
            "Compare {} and {} in terms of market strategy, product positioning, pricing, and consumer appeal. Highlight key differentiators.",
            first, second
        ),
    )
}

async fn comparison(state: &AppState, first: &str, second: &str) -> AiInsightView {
    let (context, summary) = comparison_prompt(first, second);
    ai_insight(state, &context, &summary).await
}

/// The profiles available for comparison.
#[utoipa::path(
    get,
    path = "/battles/competitors",
    responses((status = 200, description = "Competitor profiles", body = CompetitorsResponse))
)]
pub async fn competitors_handler() -> impl IntoResponse {
    Json(CompetitorsResponse {
        competitors: profiles(),
        default_first: DEFAULT_PAIR.0.to_string(),
        default_second: DEFAULT_PAIR.1.to_string(),
    })
}

/// Compares two competitors.
#[utoipa::path(
    post,
    path = "/battles/compare",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "Side-by-side comparison", body = CompareResponse),
        (status = 400, description = "Unknown competitor")
    )
)]
pub async fn compare_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let first = find_profile(&request.first)?;
    let second = find_profile(&request.second)?;
    info!("Comparing {} against {}.", first.name, second.name);
    let ai_insight = comparison(&state, &first.name, &second.name).await;
    Ok(Json(CompareResponse {
        first,
        second,
        features: feature_table(),
        ai_insight,
    }))
}

/// The comparison remark as a PDF download.
#[utoipa::path(
    post,
    path = "/battles/compare/pdf",
    request_body = CompareRequest,
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Unknown competitor"),
        (status = 422, description = "Text cannot be encoded in the report font")
    )
)]
pub async fn compare_pdf_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let first = find_profile(&request.first)?;
    let second = find_profile(&request.second)?;
    let insight = comparison(&state, &first.name, &second.name).await;
    let doc = report::build(&format!("{} vs {}", first.name, second.name), &insight.text);
    pdf_download(&state, &doc, COMPARISON_FILE)
}
