//! services/api/src/web/home.rs
//!
//! The landing view: what the studio offers and where each page lives.

use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct FeatureCard {
    pub title: String,
    pub highlights: Vec<String>,
    /// Path of the page the card links to.
    pub page: String,
}

impl FeatureCard {
    fn new(title: &str, highlights: &[&str], page: &str) -> Self {
        Self {
            title: title.to_string(),
            highlights: highlights.iter().map(|h| h.to_string()).collect(),
            page: page.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PageLink {
    pub name: String,
    pub path: String,
}

#[derive(Serialize, ToSchema)]
pub struct HomeResponse {
    pub title: String,
    pub subtitle: String,
    pub tagline: String,
    pub features: Vec<FeatureCard>,
    pub pages: Vec<PageLink>,
}

/// The six views of the dashboard, in navigation order.
pub fn pages() -> Vec<PageLink> {
    [
        ("Home", "/"),
        ("Insights", "/insights"),
        ("Competitor Analysis", "/competitors/brands"),
        ("Competitor Battles", "/battles/competitors"),
        ("Generate Styles", "/styles/options"),
        ("My Designs", "/designs"),
    ]
    .into_iter()
    .map(|(name, path)| PageLink {
        name: name.to_string(),
        path: path.to_string(),
    })
    .collect()
}

/// Feature overview and navigation.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing page content", body = HomeResponse))
)]
pub async fn home_handler() -> impl IntoResponse {
    Json(HomeResponse {
        title: "Fintastic AI".to_string(),
        subtitle: "Design Studio".to_string(),
        tagline: "Your one-stop AI-powered platform for hair trends, hairstyle generation, \
                  cost estimation, and marketing insights."
            .to_string(),
        features: vec![
            FeatureCard::new(
                "AI Insights & Trends",
                &["Discover the latest hair trends", "Google Trends analysis", "Competitor insights"],
                "/insights",
            ),
            FeatureCard::new(
                "AI Hairstyle Generator",
                &[
                    "Use AI-generated styles",
                    "Customize by length, texture, and color",
                    "See realistic hair visuals",
                ],
                "/styles/options",
            ),
            FeatureCard::new(
                "Analyse Competitors",
                &[
                    "Browse competitor products",
                    "Conduct head to head analysis",
                    "Get the edge on the competition",
                ],
                "/competitors/brands",
            ),
        ],
        pages: pages(),
    })
}
