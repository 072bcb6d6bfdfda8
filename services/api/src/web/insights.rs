//! services/api/src/web/insights.rs
//!
//! The Google Trends view: key metrics, interest over time, interest by
//! region, the related query and topic breakdowns and an AI remark on each.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use design_studio_core::analytics::{self, BarCap, BarLayout, Ranked, FIXED_BAR_CAP};
use design_studio_core::ports::Table;
use design_studio_core::records;
use design_studio_core::{RegionInterest, RelatedTerm, TrendPoint};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::web::rest::{ai_insight, bar_rows, load_rows, port_error, AiInsightView, BarRowView, HandlerError};
use crate::web::state::AppState;

pub const REGIONS: [&str; 5] = ["Worldwide", "US", "Africa", "Middle East", "Southern Africa"];
pub const TIMEFRAMES: [&str; 8] = [
    "Past hour",
    "Past 4 hours",
    "Past day",
    "Past 7 days",
    "Past 30 days",
    "Past 90 days",
    "Past 12 months",
    "Past 5 years",
];
const DEFAULT_TIMEFRAME: &str = "Past day";
const TOP_ROWS: usize = 10;
const PEAK_TIMES: usize = 3;

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct TrendsQuery {
    /// Keyword the timeline is filtered by. Defaults to the first keyword in the data.
    pub keyword: Option<String>,
    pub region: Option<String>,
    pub timeframe: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TrendOptions {
    pub regions: Vec<String>,
    pub timeframes: Vec<String>,
    pub default_region: String,
    pub default_timeframe: String,
    pub keywords: Vec<String>,
    pub notices: Vec<String>,
}

#[derive(Serialize, ToSchema, Debug, Default, PartialEq)]
pub struct KeyMetrics {
    pub peak_search_time: Option<String>,
    /// Mean interest over the whole timeline, truncated.
    pub average_interest: Option<i64>,
    pub top_rising_query: Option<String>,
    pub top_rising_topic: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TimelinePointView {
    pub date: String,
    pub time: String,
    pub interest: f64,
}

#[derive(Serialize, ToSchema, Default)]
pub struct SearchBreakdown {
    pub top_queries: Vec<BarRowView>,
    pub rising_queries: Vec<BarRowView>,
    pub top_topics: Vec<BarRowView>,
    pub rising_topics: Vec<BarRowView>,
}

#[derive(Serialize, ToSchema)]
pub struct TrendsResponse {
    pub region: String,
    pub timeframe: String,
    pub keyword: Option<String>,
    pub metrics: KeyMetrics,
    pub timeline: Vec<TimelinePointView>,
    pub highest_interest_times: Vec<BarRowView>,
    pub top_regions: Vec<BarRowView>,
    pub breakdown: SearchBreakdown,
    pub ai_insights: Vec<AiInsightView>,
    pub notices: Vec<String>,
}

//=========================================================================================
// Aggregation
//=========================================================================================

struct TrendTables {
    timeline: Vec<TrendPoint>,
    regions: Vec<RegionInterest>,
    queries: Vec<RelatedTerm>,
    topics: Vec<RelatedTerm>,
}

async fn load_trend_tables(state: &AppState, notices: &mut Vec<String>) -> Result<TrendTables, HandlerError> {
    let mut timeline = load_rows(state, Table::MultiTimeline, None, notices).await?;
    let mut regions = load_rows(state, Table::GeoMap, None, notices).await?;
    let mut queries = load_rows(state, Table::RelatedQueries, None, notices).await?;
    let mut topics = load_rows(state, Table::RelatedEntities, None, notices).await?;
    for rows in [&mut timeline, &mut regions, &mut queries, &mut topics] {
        records::normalize_country(rows);
    }

    Ok(TrendTables {
        timeline: records::trend_points(&timeline).map_err(port_error)?,
        regions: records::region_interest(&regions).map_err(port_error)?,
        queries: records::related_terms(&queries, "relatedquery").map_err(port_error)?,
        topics: records::related_terms(&topics, "relatedtopic").map_err(port_error)?,
    })
}

/// Distinct keywords in order of first appearance.
fn keywords(timeline: &[TrendPoint]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for point in timeline {
        if !seen.contains(&point.keyword) {
            seen.push(point.keyword.clone());
        }
    }
    seen
}

fn by_time<'a>(points: impl IntoIterator<Item = &'a TrendPoint>) -> Vec<Ranked> {
    points
        .into_iter()
        .map(|p| Ranked::new(p.time.clone(), p.interest))
        .collect()
}

fn by_region(regions: &[RegionInterest]) -> Vec<Ranked> {
    regions
        .iter()
        .map(|r| Ranked::new(r.region.clone(), r.interest))
        .collect()
}

fn by_interest<'a>(terms: impl IntoIterator<Item = &'a RelatedTerm>) -> Vec<Ranked> {
    terms
        .into_iter()
        .map(|t| Ranked::new(t.term.clone(), t.interest))
        .collect()
}

fn by_growth<'a>(terms: impl IntoIterator<Item = &'a RelatedTerm>) -> Vec<Ranked> {
    terms
        .into_iter()
        .map(|t| Ranked::new(t.term.clone(), t.growth))
        .collect()
}

fn in_category<'a>(terms: &'a [RelatedTerm], category: &'a str) -> impl Iterator<Item = &'a RelatedTerm> {
    terms.iter().filter(move |t| t.category == category)
}

fn key_metrics(tables: &TrendTables) -> KeyMetrics {
    let timeline = by_time(&tables.timeline);
    KeyMetrics {
        peak_search_time: analytics::peak(&timeline).map(|r| r.label.clone()),
        average_interest: analytics::mean(&timeline).map(|m| m.trunc() as i64),
        top_rising_query: analytics::peak(&by_growth(&tables.queries)).map(|r| r.label.clone()),
        top_rising_topic: analytics::peak(&by_growth(&tables.topics)).map(|r| r.label.clone()),
    }
}

/// A breakdown table: sorted descending with bars on the fixed 0..100 scale.
fn breakdown_table(rows: Vec<Ranked>) -> Vec<BarRowView> {
    bar_rows(
        &analytics::sort_descending(&rows),
        BarCap::Fixed(FIXED_BAR_CAP),
        BarLayout::ValueFirst,
    )
}

/// The `(context, summary)` pairs the page asks remarks for.
fn remark_requests(tables: &TrendTables) -> Vec<(&'static str, String)> {
    let mut requests = Vec::new();

    let peaks = analytics::top_k(&by_time(&tables.timeline), PEAK_TIMES);
    if !peaks.is_empty() {
        let times: Vec<&str> = peaks.iter().map(|r| r.label.as_str()).collect();
        requests.push((
            "Top 3 Peak Search Times",
            format!("The highest search activity occurred at {}.", times.join(", ")),
        ));
    }
    if let Some(top) = analytics::top_k(&by_region(&tables.regions), 1).first() {
        requests.push((
            "Top Interest by Region/State",
            format!("The region with the highest search interest is {}.", top.label),
        ));
    }
    if let Some(top) = analytics::top_k(&by_interest(in_category(&tables.queries, "TOP")), 1).first() {
        requests.push((
            "Top Searched Queries",
            format!("The most searched query is {}, reflecting high interest in this topic.", top.label),
        ));
    }
    if let Some(top) = analytics::top_k(&by_growth(in_category(&tables.queries, "RISING")), 1).first() {
        requests.push((
            "Fastest Growing Queries",
            format!(
                "The fastest-growing search term is {}, showing a recent surge in interest.",
                top.label
            ),
        ));
    }
    if let Some(top) = analytics::top_k(&by_interest(in_category(&tables.topics, "TOP")), 1).first() {
        requests.push((
            "Top Related Topics",
            format!(
                "The most associated topic is {}, indicating strong relevance to the main search trends.",
                top.label
            ),
        ));
    }
    if let Some(top) = analytics::top_k(&by_growth(in_category(&tables.topics, "RISING")), 1).first() {
        requests.push((
            "Fastest Growing Topics",
            format!(
                "The fastest-growing topic is {}, showing a sharp increase in search volume.",
                top.label
            ),
        ));
    }
    requests
}

fn pick(value: Option<String>, allowed: &[&str], default: &str, what: &str) -> Result<String, HandlerError> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if allowed.contains(&v.as_str()) => Ok(v),
        Some(v) => Err((StatusCode::BAD_REQUEST, format!("Unknown {}: '{}'", what, v))),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Filter choices for the trends view.
#[utoipa::path(
    get,
    path = "/insights/options",
    responses(
        (status = 200, description = "Region, timeframe and keyword choices", body = TrendOptions),
        (status = 422, description = "The timeline table lacks an expected column")
    )
)]
pub async fn options_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut notices = Vec::new();
    let rows = load_rows(&state, Table::MultiTimeline, None, &mut notices).await?;
    let timeline = records::trend_points(&rows).map_err(port_error)?;

    Ok(Json(TrendOptions {
        regions: REGIONS.iter().map(|s| s.to_string()).collect(),
        timeframes: TIMEFRAMES.iter().map(|s| s.to_string()).collect(),
        default_region: REGIONS[0].to_string(),
        default_timeframe: DEFAULT_TIMEFRAME.to_string(),
        keywords: keywords(&timeline),
        notices,
    }))
}

/// The full trends view for one keyword.
#[utoipa::path(
    get,
    path = "/insights",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Trend metrics, tables and AI remarks", body = TrendsResponse),
        (status = 400, description = "Unknown region or timeframe"),
        (status = 422, description = "A trends table lacks an expected column")
    )
)]
pub async fn trends_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendsQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let region = pick(query.region, &REGIONS, REGIONS[0], "region")?;
    let timeframe = pick(query.timeframe, &TIMEFRAMES, DEFAULT_TIMEFRAME, "timeframe")?;

    let mut notices = Vec::new();
    let tables = load_trend_tables(&state, &mut notices).await?;

    let keyword = query
        .keyword
        .filter(|k| !k.is_empty())
        .or_else(|| keywords(&tables.timeline).into_iter().next());
    let filtered: Vec<&TrendPoint> = tables
        .timeline
        .iter()
        .filter(|p| keyword.as_deref() == Some(p.keyword.as_str()))
        .collect();

    let highest_interest_times = bar_rows(
        &analytics::top_k(&by_time(filtered.iter().copied()), TOP_ROWS),
        BarCap::Observed,
        BarLayout::BarFirst,
    );
    let top_regions = bar_rows(
        &analytics::top_k(&by_region(&tables.regions), TOP_ROWS),
        BarCap::Observed,
        BarLayout::BarFirst,
    );
    let breakdown = SearchBreakdown {
        top_queries: breakdown_table(by_interest(in_category(&tables.queries, "TOP"))),
        rising_queries: breakdown_table(by_growth(in_category(&tables.queries, "RISING"))),
        top_topics: breakdown_table(by_interest(in_category(&tables.topics, "TOP"))),
        rising_topics: breakdown_table(by_growth(in_category(&tables.topics, "RISING"))),
    };

    let mut ai_insights = Vec::new();
    for (context, summary) in remark_requests(&tables) {
        ai_insights.push(ai_insight(&state, context, &summary).await);
    }

    Ok(Json(TrendsResponse {
        region,
        timeframe,
        metrics: key_metrics(&tables),
        timeline: filtered
            .iter()
            .map(|p| TimelinePointView {
                date: p.date.clone(),
                time: p.time.clone(),
                interest: p.interest,
            })
            .collect(),
        keyword,
        highest_interest_times,
        top_regions,
        breakdown,
        ai_insights,
        notices,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(keyword: &str, time: &str, interest: f64) -> TrendPoint {
        TrendPoint {
            keyword: keyword.to_string(),
            time: time.to_string(),
            date: String::new(),
            interest,
        }
    }

    fn term(term: &str, category: &str, interest: f64, growth: f64) -> RelatedTerm {
        RelatedTerm {
            term: term.to_string(),
            category: category.to_string(),
            interest,
            growth,
        }
    }

    fn tables() -> TrendTables {
        TrendTables {
            timeline: vec![
                point("braids", "06:00", 40.0),
                point("braids", "12:00", 90.0),
                point("wigs", "18:00", 90.0),
                point("wigs", "20:00", 11.0),
            ],
            regions: vec![
                RegionInterest { region: "Texas".into(), interest: 100.0 },
                RegionInterest { region: "Georgia".into(), interest: 64.0 },
            ],
            queries: vec![
                term("knotless braids", "TOP", 100.0, 0.0),
                term("boho braids", "RISING", 0.0, 250.0),
            ],
            topics: vec![term("Hairstyle", "TOP", 80.0, 5.0)],
        }
    }

    #[test]
    fn metrics_use_first_peak_and_truncated_mean() {
        let metrics = key_metrics(&tables());
        assert_eq!(metrics.peak_search_time.as_deref(), Some("12:00"));
        // (40 + 90 + 90 + 11) / 4 = 57.75
        assert_eq!(metrics.average_interest, Some(57));
        assert_eq!(metrics.top_rising_query.as_deref(), Some("boho braids"));
        assert_eq!(metrics.top_rising_topic.as_deref(), Some("Hairstyle"));
    }

    #[test]
    fn empty_tables_have_no_metrics() {
        let empty = TrendTables {
            timeline: vec![],
            regions: vec![],
            queries: vec![],
            topics: vec![],
        };
        assert_eq!(key_metrics(&empty), KeyMetrics::default());
        assert!(remark_requests(&empty).is_empty());
    }

    #[test]
    fn breakdown_clamps_to_the_fixed_scale() {
        let rows = breakdown_table(vec![Ranked::new("a", 50.0), Ranked::new("b", 250.0)]);
        assert_eq!(rows[0].label, "b");
        assert_eq!(rows[0].display, format!("250 {}", "█".repeat(20)));
        assert_eq!(rows[1].display, format!("50 {}", "█".repeat(10)));
    }

    #[test]
    fn one_remark_per_non_empty_table() {
        let requests = remark_requests(&tables());
        let contexts: Vec<&str> = requests.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            contexts,
            vec![
                "Top 3 Peak Search Times",
                "Top Interest by Region/State",
                "Top Searched Queries",
                "Fastest Growing Queries",
                "Top Related Topics",
            ]
        );
        assert_eq!(
            requests[0].1,
            "The highest search activity occurred at 12:00, 18:00, 06:00."
        );
    }

    #[test]
    fn keywords_keep_first_appearance_order() {
        assert_eq!(keywords(&tables().timeline), vec!["braids", "wigs"]);
    }

    #[test]
    fn unknown_filters_are_rejected() {
        assert_eq!(pick(None, &REGIONS, "Worldwide", "region").unwrap(), "Worldwide");
        assert!(pick(Some("Mars".into()), &REGIONS, "Worldwide", "region").is_err());
    }
}
