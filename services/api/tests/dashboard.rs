//! Drives the dashboard router end to end against in-memory adapters.

use api_lib::adapters::PdfReportAdapter;
use api_lib::web::router;
use api_lib::web::state::{AppState, SessionRegistry};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use design_studio_core::ports::{
    ContentGenerator, DataStore, ImageGenerator, ImageRequest, ObjectStorage, PortError,
    PortResult, Row, Table,
};
use design_studio_core::{ContentPipeline, ImageSettings};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Default)]
struct FakeStore {
    tables: Mutex<Vec<(Table, Vec<Row>)>>,
    inserts: Mutex<Vec<(Table, Row)>>,
    fail_reads: bool,
}

impl FakeStore {
    fn unreachable() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    fn with(self, table: Table, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        self.tables.lock().unwrap().push((table, rows));
        self
    }

    fn inserted(&self, table: Table) -> Vec<Row> {
        self.inserts
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

#[async_trait]
impl DataStore for FakeStore {
    async fn select(&self, table: Table, columns: Option<&[&str]>) -> PortResult<Vec<Row>> {
        if self.fail_reads {
            return Err(PortError::Upstream("connection refused".to_string()));
        }
        let rows = self
            .tables
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        if let Some(columns) = columns {
            for row in &rows {
                if let Some(missing) = columns.iter().find(|c| !row.contains_key(**c)) {
                    return Err(PortError::MissingColumn(missing.to_string()));
                }
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Row) -> PortResult<()> {
        self.inserts.lock().unwrap().push((table, row));
        Ok(())
    }
}

struct FixedGenerator;

#[async_trait]
impl ContentGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> PortResult<String> {
        Ok("Generated content.".to_string())
    }
}

/// Returns the same references for every request; an empty list models a
/// generator that produced nothing usable.
struct FixedImages(Vec<String>);

impl FixedImages {
    fn halo() -> Self {
        Self(vec!["/tmp/gradio/halo.webp".to_string()])
    }
}

#[async_trait]
impl ImageGenerator for FixedImages {
    async fn generate_image(&self, _request: &ImageRequest) -> PortResult<Vec<String>> {
        Ok(self.0.clone())
    }

    async fn fetch_image(&self, _reference: &str) -> PortResult<Bytes> {
        Ok(Bytes::from_static(b"\x89PNG"))
    }
}

#[derive(Default)]
struct FakeBucket {
    names: Mutex<Vec<String>>,
    offline: bool,
}

#[async_trait]
impl ObjectStorage for FakeBucket {
    async fn upload(&self, name: &str, _content_type: &str, _data: Bytes) -> PortResult<String> {
        if self.offline {
            return Err(PortError::Upstream("bucket offline".to_string()));
        }
        self.names.lock().unwrap().push(name.to_string());
        Ok(format!("https://bucket.test/{}", name))
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn app(store: Arc<FakeStore>, bucket: Arc<FakeBucket>) -> Router {
    app_with(store, FixedImages::halo(), Some(bucket))
}

fn app_with(store: Arc<FakeStore>, images: FixedImages, storage: Option<Arc<dyn ObjectStorage>>) -> Router {
    let pipeline = Arc::new(ContentPipeline::new(
        Arc::new(FixedGenerator),
        Arc::new(images),
        ImageSettings::default(),
    ));
    router(Arc::new(AppState {
        store,
        pipeline,
        storage,
        renderer: Arc::new(PdfReportAdapter::new()),
        sessions: SessionRegistry::new(),
    }))
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::get(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    content_type: Option<String>,
    body: Bytes,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn call(app: &Router, req: Request<Body>) -> Reply {
    let res = app.clone().oneshot(req).await.unwrap();
    let header_text = |name: header::HeaderName| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let cookie = header_text(header::SET_COOKIE)
        .and_then(|c| c.split(';').next().map(str::to_string));
    let content_type = header_text(header::CONTENT_TYPE);
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        cookie,
        content_type,
        body,
    }
}

fn design(insights: &[&str]) -> Value {
    json!({
        "design_name": "Midnight Halo",
        "demographic": "Young Adults",
        "length": "Long",
        "color": "Purple",
        "braid_type": "Box Braids",
        "style_note": "beaded ends",
        "selected_insights": insights,
    })
}

/// A generate request that carries its own image prompt.
fn with_prompt(mut body: Value) -> Value {
    body["prompt"] = json!("Copper knotless braids");
    body
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn home_opens_a_session_and_lists_pages() {
    let app = app(Arc::new(FakeStore::default()), Arc::new(FakeBucket::default()));
    let reply = call(&app, get("/", None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.cookie.as_ref().unwrap().starts_with("studio_session="));
    assert_eq!(reply.json()["pages"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn insights_are_deduplicated_within_a_session() {
    let store = Arc::new(FakeStore::default());
    let app = app(store.clone(), Arc::new(FakeBucket::default()));
    let body = json!({ "text": "Knotless braids are rising" });

    let first = call(&app, send_json("POST", "/designer/insights", None, body.clone())).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.json()["added"], true);
    assert_eq!(first.json()["mirrored"], true);
    let cookie = first.cookie.unwrap();

    let second = call(&app, send_json("POST", "/designer/insights", Some(&cookie), body)).await;
    assert_eq!(second.json()["added"], false);
    assert_eq!(second.json()["message"], "Insight already saved.");
    assert!(second.cookie.is_none());

    let list = call(&app, get("/designer/insights", Some(&cookie))).await;
    assert_eq!(list.json()["insights"], json!(["Knotless braids are rising"]));
    assert_eq!(store.inserted(Table::DesignerInsights).len(), 1);

    // A fresh session starts empty.
    let other = call(&app, get("/designer/insights", None)).await;
    assert_eq!(other.json()["insights"], json!([]));
}

#[tokio::test]
async fn empty_insights_are_rejected() {
    let app = app(Arc::new(FakeStore::default()), Arc::new(FakeBucket::default()));
    let reply = call(&app, send_json("POST", "/designer/insights", None, json!({ "text": "  " }))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trends_view_renders_bars_and_remarks() {
    let store = FakeStore::default()
        .with(
            Table::MultiTimeline,
            vec![
                json!({ "keyword": "braids", "time": "09:00", "interest": 50 }),
                json!({ "keyword": "braids", "time": "10:00", "interest": 100 }),
                json!({ "keyword": "locs", "time": "09:00", "interest": 70 }),
            ],
        )
        .with(
            Table::GeoMap,
            vec![json!({ "region/state": "Texas", "interest": 80, "country": "US, Texas" })],
        );
    let app = app(Arc::new(store), Arc::new(FakeBucket::default()));

    let reply = call(&app, get("/insights?keyword=braids", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body = reply.json();

    let times = body["highest_interest_times"].as_array().unwrap();
    assert_eq!(times.len(), 2);
    assert_eq!(times[0]["label"], "10:00");
    assert_eq!(times[0]["display"], format!("{} 100", "█".repeat(20)));
    assert_eq!(times[1]["display"], format!("{} 50", "█".repeat(10)));

    assert_eq!(body["metrics"]["peak_search_time"], "10:00");
    assert_eq!(body["metrics"]["average_interest"], 73);
    assert_eq!(body["top_regions"][0]["label"], "Texas");
    assert_eq!(body["ai_insights"][0]["text"], "Generated content.");
}

#[tokio::test]
async fn trends_view_rejects_unknown_regions() {
    let app = app(Arc::new(FakeStore::default()), Arc::new(FakeBucket::default()));
    let reply = call(&app, get("/insights?region=Atlantis", None)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_columns_halt_only_that_view() {
    let store = FakeStore::default().with(
        Table::CompetitorProducts,
        vec![json!({ "title": "Untitled", "link": "https://shop.test/1" })],
    );
    let app = app(Arc::new(store), Arc::new(FakeBucket::default()));

    let browse = call(&app, send_json("POST", "/competitors/browse", None, json!({}))).await;
    assert_eq!(browse.status, StatusCode::UNPROCESSABLE_ENTITY);

    let analysis = call(&app, send_json("POST", "/competitors/analysis", None, json!({}))).await;
    assert_eq!(analysis.status, StatusCode::UNPROCESSABLE_ENTITY);

    let home = call(&app, get("/", None)).await;
    assert_eq!(home.status, StatusCode::OK);
}

#[tokio::test]
async fn browse_clamps_the_page() {
    let products = (0..14)
        .map(|i| {
            json!({
                "name": format!("Product {}", i),
                "link": format!("https://shop.test/{}", i),
                "image_url": "",
                "subcategory": "Braids",
                "length": "26\"",
            })
        })
        .collect();
    let store = FakeStore::default().with(Table::CompetitorProducts, products);
    let app = app(Arc::new(store), Arc::new(FakeBucket::default()));

    let reply = call(
        &app,
        send_json("POST", "/competitors/browse", None, json!({ "name": "All", "page": 5 })),
    )
    .await;
    let body = reply.json();
    assert_eq!(body["page"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["total_matches"], 14);
    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1]["name"], "Product 13");
}

#[tokio::test]
async fn battles_compare_known_brands_only() {
    let app = app(Arc::new(FakeStore::default()), Arc::new(FakeBucket::default()));

    let unknown = call(
        &app,
        send_json("POST", "/battles/compare", None, json!({ "first": "Outre", "second": "Acme" })),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let known = call(
        &app,
        send_json("POST", "/battles/compare", None, json!({ "first": "Outre", "second": "Darling" })),
    )
    .await;
    assert_eq!(known.status, StatusCode::OK);
    let body = known.json();
    assert_eq!(body["features"].as_array().unwrap().len(), 8);
    assert_eq!(body["ai_insight"]["context"], "Outre vs. Darling Hair Market Analysis");

    let pdf = call(
        &app,
        send_json("POST", "/battles/compare/pdf", None, json!({ "first": "Outre", "second": "Darling" })),
    )
    .await;
    assert_eq!(pdf.status, StatusCode::OK);
    assert!(pdf.body.starts_with(b"%PDF"));
}

#[tokio::test]
async fn design_flow_generates_exports_and_saves() {
    let store = Arc::new(FakeStore::default());
    let bucket = Arc::new(FakeBucket::default());
    let app = app(store.clone(), bucket.clone());

    // Nothing to save before an image exists.
    let early = call(&app, send_json("POST", "/styles/save", None, json!({}))).await;
    assert_eq!(early.status, StatusCode::NOT_FOUND);

    // Keep an insight, then reference it from the design.
    let kept = call(
        &app,
        send_json("POST", "/designer/insights", None, json!({ "text": "Purple is trending" })),
    )
    .await;
    let cookie = kept.cookie.unwrap();

    let prompt = call(
        &app,
        send_json("POST", "/styles/prompt", Some(&cookie), design(&["Purple is trending"])),
    )
    .await;
    assert_eq!(prompt.status, StatusCode::OK);
    assert_eq!(prompt.json()["prompt"], "Generated content.");

    let refined = call(
        &app,
        send_json("PUT", "/styles/prompt", Some(&cookie), json!({ "prompt": "Purple box braids, studio light" })),
    )
    .await;
    assert_eq!(refined.status, StatusCode::OK);

    let generated = call(
        &app,
        send_json(
            "POST",
            "/styles/generate",
            Some(&cookie),
            design(&["Purple is trending", "Box braids outsell wigs"]),
        ),
    )
    .await;
    assert_eq!(generated.status, StatusCode::OK);
    let body = generated.json();
    let url = body["hairstyle"]["public_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("https://bucket.test/"));
    assert!(url.ends_with(".webp"));
    assert_eq!(body["hairstyle"]["image_prompt"], "Purple box braids, studio light");
    assert_eq!(body["blocks"].as_array().unwrap().len(), 8);
    assert_eq!(bucket.names.lock().unwrap().len(), 1);

    let latest = call(&app, get("/styles/latest", Some(&cookie))).await;
    assert_eq!(latest.json()["generated_hairstyles"], 1);

    let stage = call(&app, get("/styles/report/marketing", Some(&cookie))).await;
    assert_eq!(stage.status, StatusCode::OK);
    assert_eq!(stage.content_type.as_deref(), Some("application/pdf"));
    assert!(stage.body.starts_with(b"%PDF"));

    let unknown_stage = call(&app, get("/styles/report/lighting", Some(&cookie))).await;
    assert_eq!(unknown_stage.status, StatusCode::NOT_FOUND);

    let plan = call(&app, get("/styles/report", Some(&cookie))).await;
    assert_eq!(plan.status, StatusCode::OK);
    assert!(plan.body.starts_with(b"%PDF"));

    let saved = call(&app, send_json("POST", "/styles/save", Some(&cookie), json!({}))).await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.json()["design_saved"], true);
    assert_eq!(saved.json()["insights_added"], 1);

    let designs = store.inserted(Table::Designs);
    assert_eq!(designs.len(), 1);
    assert_eq!(designs[0]["image_url"], Value::String(url));
    assert_eq!(
        designs[0]["description"],
        "Generated a Box Braids hairstyle in Purple, length: Long. Special: beaded ends"
    );
    assert_eq!(
        designs[0]["selected_insights"],
        json!(["Purple is trending", "Box braids outsell wigs"])
    );
    // Only the insight the session had not kept yet is written.
    let mirrored = store.inserted(Table::DesignerInsights);
    assert_eq!(mirrored.len(), 2);
    assert_eq!(mirrored[1]["insight"], "Box braids outsell wigs");

    let list = call(&app, get("/designer/insights", Some(&cookie))).await;
    assert_eq!(
        list.json()["insights"],
        json!(["Purple is trending", "Box braids outsell wigs"])
    );
}

#[tokio::test]
async fn generating_without_a_prompt_is_rejected() {
    let app = app(Arc::new(FakeStore::default()), Arc::new(FakeBucket::default()));
    let reply = call(&app, send_json("POST", "/styles/generate", None, design(&[]))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8_lossy(&reply.body),
        "Please enter a description for the image."
    );
}

#[tokio::test]
async fn unreachable_store_degrades_views_to_notices() {
    let app = app(Arc::new(FakeStore::unreachable()), Arc::new(FakeBucket::default()));

    let trends = call(&app, get("/insights", None)).await;
    assert_eq!(trends.status, StatusCode::OK);
    let body = trends.json();
    let notices = body["notices"].as_array().unwrap();
    assert!(notices
        .iter()
        .any(|n| n == "Error fetching brd_gtrends_multitimeline: connection refused"));
    assert_eq!(body["highest_interest_times"], json!([]));
    assert_eq!(body["top_regions"], json!([]));

    let designs = call(&app, get("/designs", None)).await;
    assert_eq!(designs.status, StatusCode::OK);
    let body = designs.json();
    assert_eq!(body["designs"], json!([]));
    assert_eq!(
        body["notices"],
        json!([
            "Error fetching brd_design: connection refused",
            "Error fetching brd_gtrends_designer_insights: connection refused"
        ])
    );
}

#[tokio::test]
async fn empty_image_result_keeps_content_and_skips_the_hairstyle() {
    let bucket = Arc::new(FakeBucket::default());
    let app = app_with(
        Arc::new(FakeStore::default()),
        FixedImages(Vec::new()),
        Some(bucket.clone()),
    );
    let body = with_prompt(design(&[]));

    let generated = call(&app, send_json("POST", "/styles/generate", None, body)).await;
    assert_eq!(generated.status, StatusCode::OK);
    let cookie = generated.cookie.clone().unwrap();
    let reply = generated.json();
    assert!(reply["hairstyle"].is_null());
    assert_eq!(reply["blocks"].as_array().unwrap().len(), 8);
    assert!(reply["notices"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n == "No valid image returned from the API. Please try again."));
    assert!(bucket.names.lock().unwrap().is_empty());

    let latest = call(&app, get("/styles/latest", Some(&cookie))).await;
    assert_eq!(latest.json()["generated_hairstyles"], 0);

    let save = call(&app, send_json("POST", "/styles/save", Some(&cookie), json!({}))).await;
    assert_eq!(save.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_upload_still_keeps_the_hairstyle() {
    let store = Arc::new(FakeStore::default());
    let bucket = Arc::new(FakeBucket {
        offline: true,
        ..Default::default()
    });
    let app = app_with(store.clone(), FixedImages::halo(), Some(bucket));
    let body = with_prompt(design(&[]));

    let generated = call(&app, send_json("POST", "/styles/generate", None, body)).await;
    assert_eq!(generated.status, StatusCode::OK);
    let cookie = generated.cookie.clone().unwrap();
    let reply = generated.json();
    assert!(reply["hairstyle"]["public_url"].is_null());
    assert!(reply["notices"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n == "Failed to upload image: bucket offline"));

    let latest = call(&app, get("/styles/latest", Some(&cookie))).await;
    assert_eq!(latest.json()["generated_hairstyles"], 1);

    let saved = call(&app, send_json("POST", "/styles/save", Some(&cookie), json!({}))).await;
    assert_eq!(saved.json()["design_saved"], true);
    assert_eq!(store.inserted(Table::Designs)[0]["image_url"], Value::Null);
}

#[tokio::test]
async fn missing_bucket_is_reported_not_fatal() {
    let app = app_with(Arc::new(FakeStore::default()), FixedImages::halo(), None);
    let body = with_prompt(design(&[]));

    let generated = call(&app, send_json("POST", "/styles/generate", None, body)).await;
    assert_eq!(generated.status, StatusCode::OK);
    let reply = generated.json();
    assert!(reply["hairstyle"]["public_url"].is_null());
    assert_eq!(reply["hairstyle"]["image_ref"], "/tmp/gradio/halo.webp");
    assert!(reply["notices"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n == "Image storage is not configured; the image was not uploaded."));
}
