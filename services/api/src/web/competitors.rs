//! services/api/src/web/competitors.rs
//!
//! The competitor analysis view: product metrics and distributions for the
//! tracked catalog, a paginated product browser and static brand summaries.

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use design_studio_core::analytics::{self, BarCap, BarLayout, FIXED_BAR_CAP};
use design_studio_core::ports::Table;
use design_studio_core::records;
use design_studio_core::CompetitorProduct;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::rest::{ai_insight, bar_rows, load_rows, port_error, AiInsightView, BarRowView, HandlerError};
use crate::web::state::AppState;

pub const PAGE_SIZE: usize = 12;
pub const GRID_COLUMNS: usize = 4;
const UNKNOWN: &str = "N/A";

//=========================================================================================
// Payloads
//=========================================================================================

/// Multi-select filters. An empty list does not filter.
#[derive(Deserialize, ToSchema, Default, Debug)]
#[serde(default)]
pub struct ProductFilters {
    pub subcategories: Vec<String>,
    pub lengths: Vec<String>,
    pub names: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FilterOptions {
    pub subcategories: Vec<String>,
    pub lengths: Vec<String>,
    pub names: Vec<String>,
}

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct ProductMetrics {
    /// Size of the whole catalog, filters not applied.
    pub total_products: usize,
    pub most_common_subcategory: Option<String>,
    pub latest_modified: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductListing {
    pub name: String,
    pub subcategory: String,
    pub quantity: f64,
    pub length: String,
    pub link: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub filter_options: FilterOptions,
    pub metrics: ProductMetrics,
    pub by_subcategory: Vec<BarRowView>,
    pub by_length: Vec<BarRowView>,
    pub ai_insight: Option<AiInsightView>,
    pub listings: Vec<ProductListing>,
    /// Ready-made remarks the designer can keep.
    pub suggested_insights: Vec<String>,
    pub notices: Vec<String>,
}

#[derive(Deserialize, ToSchema, Default, Debug)]
#[serde(default)]
pub struct BrowseRequest {
    /// Exact product name; `None` or `"All"` shows every product.
    pub name: Option<String>,
    pub subcategories: Vec<String>,
    pub lengths: Vec<String>,
    /// One-based; clamped into the available range.
    pub page: Option<usize>,
}

#[derive(Serialize, ToSchema, Clone)]
pub struct ProductCard {
    pub name: String,
    pub link: String,
    pub image_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct BrowseResponse {
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    /// Grid rows of up to four cards.
    pub rows: Vec<Vec<ProductCard>>,
    pub notices: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BrandSummary {
    pub name: String,
    pub headline: String,
    pub site: String,
    pub overview: String,
    pub product_lines: Vec<String>,
    pub selling_points: Vec<String>,
    pub market_position: Vec<String>,
    pub marketing: Vec<String>,
    pub stands_out: Vec<String>,
}

//=========================================================================================
// Aggregation
//=========================================================================================

fn sorted_unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = values.filter(|v| !v.is_empty()).map(str::to_string).collect();
    out.sort();
    out.dedup();
    out
}

fn matches(selected: &[String], value: &str) -> bool {
    selected.is_empty() || selected.iter().any(|s| s == value)
}

fn apply_filters<'a>(products: &'a [CompetitorProduct], filters: &ProductFilters) -> Vec<&'a CompetitorProduct> {
    products
        .iter()
        .filter(|p| matches(&filters.subcategories, &p.subcategory))
        .filter(|p| matches(&filters.lengths, &p.length))
        .filter(|p| matches(&filters.names, &p.name))
        .collect()
}

/// The greatest non-empty `modified` value.
fn latest_modified<'a>(products: impl IntoIterator<Item = &'a CompetitorProduct>) -> Option<String> {
    products
        .into_iter()
        .map(|p| p.modified.as_str())
        .filter(|m| !m.is_empty())
        .max()
        .map(str::to_string)
}

fn product_metrics(products: &[CompetitorProduct]) -> ProductMetrics {
    ProductMetrics {
        total_products: products.len(),
        most_common_subcategory: analytics::mode(products.iter().map(|p| p.subcategory.as_str())),
        latest_modified: latest_modified(products),
    }
}

fn distribution<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<BarRowView> {
    bar_rows(
        &analytics::value_counts(labels),
        BarCap::Fixed(FIXED_BAR_CAP),
        BarLayout::ValueFirst,
    )
}

fn product_summary(filtered: &[&CompetitorProduct]) -> String {
    let subcategory = analytics::mode(filtered.iter().map(|p| p.subcategory.as_str()));
    let length = analytics::mode(filtered.iter().map(|p| p.length.as_str()));
    format!(
        "- Most Common Subcategory: {}\n- Most Common Length: {}\n- Total Products: {}",
        subcategory.as_deref().unwrap_or(UNKNOWN),
        length.as_deref().unwrap_or(UNKNOWN),
        filtered.len()
    )
}

/// Where a requested page lands: `(page, total_pages, start, end)` over `total` items.
pub fn paginate(total: usize, requested: Option<usize>) -> (usize, usize, usize, usize) {
    let total_pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = requested.unwrap_or(1).clamp(1, total_pages);
    let start = ((page - 1) * PAGE_SIZE).min(total);
    let end = (start + PAGE_SIZE).min(total);
    (page, total_pages, start, end)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Metrics, distributions and listings for the filtered catalog.
#[utoipa::path(
    post,
    path = "/competitors/analysis",
    request_body = ProductFilters,
    responses(
        (status = 200, description = "Catalog analysis", body = AnalysisResponse),
        (status = 422, description = "The product table lacks an expected column")
    )
)]
pub async fn analysis_handler(
    State(state): State<Arc<AppState>>,
    Json(filters): Json<ProductFilters>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut notices = Vec::new();
    let rows = load_rows(
        &state,
        Table::CompetitorProducts,
        Some(records::PRODUCT_COLUMNS),
        &mut notices,
    )
    .await?;
    let products = records::competitor_products(&rows).map_err(port_error)?;
    if products.is_empty() {
        notices.push("No product data found.".to_string());
    }

    let filtered = apply_filters(&products, &filters);
    let metrics = product_metrics(&products);

    let mut suggested_insights = vec![format!(
        "- Total Products: {}\n- Most Common Subcategory: {}\n- Latest Product Added on: {}",
        metrics.total_products,
        metrics.most_common_subcategory.as_deref().unwrap_or(UNKNOWN),
        metrics.latest_modified.as_deref().unwrap_or(UNKNOWN),
    )];

    let ai = if filtered.is_empty() {
        None
    } else {
        let summary = product_summary(&filtered);
        suggested_insights.push(summary.clone());
        suggested_insights.push(format!(
            "There are {} products available. The latest product was added on {}.",
            filtered.len(),
            latest_modified(filtered.iter().copied()).as_deref().unwrap_or(UNKNOWN)
        ));
        Some(ai_insight(&state, "Product Insights", &summary).await)
    };

    Ok(Json(AnalysisResponse {
        filter_options: FilterOptions {
            subcategories: sorted_unique(products.iter().map(|p| p.subcategory.as_str())),
            lengths: sorted_unique(products.iter().map(|p| p.length.as_str())),
            names: sorted_unique(products.iter().map(|p| p.name.as_str())),
        },
        by_subcategory: distribution(filtered.iter().map(|p| p.subcategory.as_str())),
        by_length: distribution(filtered.iter().map(|p| p.length.as_str())),
        listings: filtered
            .iter()
            .map(|p| ProductListing {
                name: p.name.clone(),
                subcategory: p.subcategory.clone(),
                quantity: p.quantity,
                length: p.length.clone(),
                link: p.link.clone(),
            })
            .collect(),
        metrics,
        ai_insight: ai,
        suggested_insights,
        notices,
    }))
}

/// One page of the product grid.
#[utoipa::path(
    post,
    path = "/competitors/browse",
    request_body = BrowseRequest,
    responses(
        (status = 200, description = "A page of product cards", body = BrowseResponse),
        (status = 422, description = "The product table has no name column")
    )
)]
pub async fn browse_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BrowseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut notices = Vec::new();
    let rows = load_rows(&state, Table::CompetitorProducts, None, &mut notices).await?;
    let products = records::competitor_products(&rows).map_err(port_error)?;

    let name = request.name.filter(|n| n != "All" && !n.is_empty());
    let matching: Vec<&CompetitorProduct> = products
        .iter()
        .filter(|p| name.as_deref().map_or(true, |n| p.name == n))
        .filter(|p| matches(&request.subcategories, &p.subcategory))
        .filter(|p| matches(&request.lengths, &p.length))
        .collect();

    let (page, total_pages, start, end) = paginate(matching.len(), request.page);
    let cards: Vec<ProductCard> = matching[start..end]
        .iter()
        .map(|p| ProductCard {
            name: p.name.clone(),
            link: p.link.clone(),
            image_url: p.image_url.clone(),
        })
        .collect();
    if cards.is_empty() {
        notices.push("No products found. Try adjusting your filters.".to_string());
    }

    Ok(Json(BrowseResponse {
        page,
        total_pages,
        total_matches: matching.len(),
        rows: cards.chunks(GRID_COLUMNS).map(<[ProductCard]>::to_vec).collect(),
        notices,
    }))
}

/// Summaries of the tracked brands.
#[utoipa::path(
    get,
    path = "/competitors/brands",
    responses((status = 200, description = "Brand summaries", body = [BrandSummary]))
)]
pub async fn brands_handler() -> impl IntoResponse {
    Json(brand_summaries())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn brand_summaries() -> Vec<BrandSummary> {
    vec![
        BrandSummary {
            name: "Outre".into(),
            headline: "A leading hair brand offering a variety of synthetic and human hair braiding styles.".into(),
            site: "https://www.outre.com/".into(),
            overview: "Outre is a leading hair brand known for its synthetic and human hair braiding \
                       styles, wigs, and extensions. The brand offers a wide range of high-quality, \
                       trendy, and innovative hair solutions, making it a top choice for hairstylists \
                       and consumers alike."
                .into(),
            product_lines: strings(&[
                "Braids: X-Pression, Lil Looks, Pre-Stretched, Bulk Styles",
                "Wigs: Lace Fronts, Full Wigs, HD Lace, Melted Hairline",
                "Weaves & Extensions: Human & Synthetic Hair Blends",
                "Crochet Hair: Pre-looped, Twist & Loc Styles",
            ]),
            selling_points: strings(&[
                "Affordable yet high-quality: competitive pricing without compromising quality",
                "Wide variety of styles: options from natural looks to bold, trendy colors",
                "Heat-resistant & long-lasting fibers: many synthetic products can be heat-styled",
                "Pre-stretched & pre-looped options: reduces install time for stylists",
                "Innovative designs: like Melted Hairline wigs for seamless blending",
            ]),
            market_position: strings(&[
                "Popular among hairstylists & influencers, with a strong presence on social media & YouTube",
                "Competes with brands like Sensationnel & Femi Collection in synthetic hair innovation",
                "Global brand appeal: available in the US, Africa, and international markets",
            ]),
            marketing: strings(&[
                "Strong social media campaigns: engaging hairstylist content & tutorials",
                "Influencer & celebrity collaborations: drives product awareness & credibility",
                "Retail & online presence: available in beauty supply stores & online platforms",
            ]),
            stands_out: strings(&[
                "Diverse & trend-driven styles that keep up with global beauty trends",
                "Innovative product features such as HD Lace, Pre-Stretched Braids, Melted Hairline Wigs",
                "Accessibility & affordability that appeal to a wide range of customers",
            ]),
        },
        BrandSummary {
            name: "Sensationnel".into(),
            headline: "A diverse hair brand offering a variety of trendy styles.".into(),
            site: "https://www.sensationnel.com/".into(),
            overview: "Sensationnel is a well-known hair brand that offers a wide array of synthetic \
                       and human hair products, including wigs, braids, weaves, and extensions. They \
                       focus on providing trendy and high-quality options to consumers."
                .into(),
            product_lines: strings(&[
                "Wigs: Lace Front Wigs, Full Wigs, Part Wigs",
                "Braids: Pre-Stretched Braids, Synthetic Braiding Hair",
                "Weaves & Extensions: Human Hair Weaves, Synthetic Weaves",
                "Other: Crochet Hair, Ponytails",
            ]),
            selling_points: strings(&[
                "Trend-focused: products reflect the latest hair trends",
                "Diverse product range: many styles, colors, and materials",
                "Quality: durable and long-lasting products",
                "Affordability: competitive pricing for a wide range of consumers",
            ]),
            market_position: strings(&[
                "Strong presence online and in beauty supply stores",
                "Popular among consumers and hairstylists alike",
                "Competes with brands like Outre and Bobbi Boss",
            ]),
            marketing: strings(&[
                "Social media marketing on platforms like Instagram and Facebook",
                "Influencer collaborations with popular beauty influencers",
                "Promotional events to showcase new products",
            ]),
            stands_out: strings(&[
                "Commitment to trendiness: always innovating to meet the latest hair trends",
                "Wide variety of styles",
                "Quality: durable and long-lasting",
            ]),
        },
        BrandSummary {
            name: "X-pression".into(),
            headline: "A brand specializing in braiding hair with a focus on length and volume.".into(),
            site: "https://www.x-pression.co".into(),
            overview: "X-pression is widely recognized in the braiding hair market for its extensive \
                       length and volume options. It is a popular choice for creating voluminous and \
                       long braided hairstyles."
                .into(),
            product_lines: strings(&["Braiding Hair: synthetic braiding hair in various lengths and colors"]),
            selling_points: strings(&[
                "Exceptional length and volume for braided hairstyles",
                "Wide color range, from natural tones to vibrant hues",
                "Versatility across braiding techniques and styles",
                "Affordability: competitively priced for a broad consumer base",
            ]),
            market_position: strings(&[
                "Dominant brand in the braiding hair category",
                "Commonly found in beauty supply stores and online retailers",
                "Competes with other braiding hair brands like RastAfri and Ruwa",
            ]),
            marketing: strings(&[
                "Relies on word-of-mouth and product visibility in retail locations",
                "Collaborates with hairstylists for promotional purposes",
            ]),
            stands_out: strings(&[
                "Focus on length and volume for dramatic braided looks",
                "Wide color range suitable for various braiding techniques and styles",
                "Dominant brand in the braiding hair category",
            ]),
        },
    ]
}
