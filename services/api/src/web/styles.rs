//! services/api/src/web/styles.rs
//!
//! The Generate Styles workflow. A designer picks attributes, generates an
//! image prompt (and may edit it), generates the hairstyle image together with
//! the remaining content stages, downloads reports and saves the design.
//!
//! Every step works on the caller's session; the latest generated hairstyle
//! is the one downloads and saves operate on.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use design_studio_core::ports::Table;
use design_studio_core::{records, report, Report};
use design_studio_core::{
    ContentBlock, DesignAttributes, DesignPackage, GeneratedHairstyle, SavedDesign, Stage,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::designer::keep_insight;
use crate::web::rest::{file_stem, pdf_download, port_error, HandlerError};
use crate::web::state::{AppState, SharedSession};

pub const DEMOGRAPHICS: [&str; 7] = [
    "Teens",
    "Young Adults",
    "Professionals",
    "Elderly",
    "Men",
    "Women",
    "Unisex",
];
pub const LENGTHS: [&str; 6] = ["Short", "Medium", "Long", "Extra Long", "Bob Cut", "Shoulder Length"];
pub const DEFAULT_LENGTH: &str = "Medium";
pub const COLORS: [&str; 10] = [
    "Black", "Blonde", "Brown", "Red", "Purple", "Blue", "Green", "Pink", "Orange", "Gray",
];
pub const BRAID_TYPES: [&str; 11] = [
    "Box Braids",
    "Knotless Braids",
    "Cornrows",
    "Twists",
    "Locs",
    "Faux Locs",
    "Micro Braids",
    "Senegalese Twists",
    "Crochet Braids",
    "Ghana Braids",
    "Tribal Braids",
];

const EMPTY_PROMPT: &str = "Please enter a description for the image.";
const NO_IMAGE: &str = "No valid image returned from the API. Please try again.";
const NO_HAIRSTYLE: &str = "No hairstyle has been generated yet.";
const NO_CONTENT: &str = "No design content has been generated yet.";
const IMAGE_CONTENT_TYPE: &str = "image/png";

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct StyleOptions {
    pub demographics: Vec<String>,
    pub lengths: Vec<String>,
    pub default_length: String,
    pub colors: Vec<String>,
    pub braid_types: Vec<String>,
    /// Insights kept in this session, selectable for the design.
    pub insights: Vec<String>,
    pub image_prompt: Option<String>,
    pub generated_hairstyles: usize,
}

/// The attributes of one design iteration.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct DesignRequest {
    pub design_name: String,
    pub demographic: String,
    pub length: String,
    pub color: String,
    pub braid_type: String,
    #[serde(default)]
    pub style_note: String,
    /// Any insight text; saving keeps the ones this session has not seen yet.
    #[serde(default)]
    pub selected_insights: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ImagePromptResponse {
    pub prompt: String,
    pub failed: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct RefinePromptRequest {
    pub prompt: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub design: DesignRequest,
    /// Overrides the session's image prompt.
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Serialize, ToSchema, Clone)]
pub struct HairstyleView {
    pub id: Uuid,
    pub design_name: String,
    pub image_ref: String,
    pub image_prompt: String,
    pub public_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&GeneratedHairstyle> for HairstyleView {
    fn from(h: &GeneratedHairstyle) -> Self {
        Self {
            id: h.id,
            design_name: h.attributes.design_name.clone(),
            image_ref: h.image_ref.clone(),
            image_prompt: h.image_prompt.clone(),
            public_url: h.public_url.clone(),
            created_at: h.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StageBlockView {
    pub stage: String,
    pub title: String,
    pub text: String,
    pub failed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct GenerateResponse {
    /// `None` when the image generator returned nothing usable.
    pub hairstyle: Option<HairstyleView>,
    pub blocks: Vec<StageBlockView>,
    pub notices: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LatestResponse {
    pub hairstyle: Option<HairstyleView>,
    pub blocks: Vec<StageBlockView>,
    pub generated_hairstyles: usize,
}

#[derive(Serialize, ToSchema)]
pub struct SaveResponse {
    pub design_saved: bool,
    pub message: String,
    /// Selected insights newly kept by this save.
    pub insights_added: usize,
    pub notices: Vec<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct StagePath {
    /// One of the stage slugs, e.g. `marketing`.
    pub stage: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn attributes(design: DesignRequest) -> DesignAttributes {
    DesignAttributes {
        design_name: design.design_name,
        demographic: design.demographic,
        length: design.length,
        color: design.color,
        braid_type: design.braid_type,
        style_note: design.style_note,
        selected_insights: design.selected_insights,
    }
}

fn block_views(package: Option<&DesignPackage>) -> Vec<StageBlockView> {
    let Some(package) = package else {
        return Vec::new();
    };
    Stage::ALL
        .into_iter()
        .filter_map(|stage| {
            package.block(stage).map(|block| StageBlockView {
                stage: stage.slug().to_string(),
                title: stage.title().to_string(),
                text: block.display_text(stage.label()),
                failed: block.is_failed(),
            })
        })
        .collect()
}

/// Heading of a single-stage download.
pub fn stage_report_title(stage: Stage, design_name: &str) -> String {
    let subject = match stage {
        Stage::ManufacturingCost => "Manufacturing Costs",
        Stage::CustomerCost => "Customer Costs",
        Stage::LookAndFeel => "Design Look and Feel",
        Stage::Marketing => "Marketing Plan",
        Stage::Packaging => "Packaging Plan",
        Stage::Formulation => "Formulation Details",
        other => other.title(),
    };
    format!("{} for {}", subject, design_name)
}

/// Title page lines and one section per stage, in fixed order.
pub fn launch_plan(package: &DesignPackage) -> Report {
    let attrs = &package.attributes;
    let subtitle = vec![
        format!("Target Demographic: {}", attrs.demographic),
        "Generated by AI Braid Design Studio".to_string(),
    ];
    let sections = Stage::ALL
        .into_iter()
        .map(|stage| (stage.title().to_string(), package.display_text(stage)))
        .collect();
    report::build_full(
        &format!("Braid Design Launch Plan: {}", attrs.design_name),
        &subtitle,
        sections,
    )
}

pub fn design_description(attrs: &DesignAttributes) -> String {
    format!(
        "Generated a {} hairstyle in {}, length: {}. Special: {}",
        attrs.braid_type, attrs.color, attrs.length, attrs.style_note
    )
}

/// Object name for an uploaded image, keeping the reference's extension.
pub fn upload_name(id: Uuid, image_ref: &str) -> String {
    let file = image_ref.rsplit('/').next().unwrap_or(image_ref);
    let file = file.split(['?', '#']).next().unwrap_or(file);
    let ext = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && ext.len() <= 5 => format!(".{}", ext),
        _ => ".png".to_string(),
    };
    format!("{}{}", id, ext)
}

/// Fetches the generated image and stores it. `None` when either step fails.
async fn upload_image(state: &AppState, id: Uuid, image_ref: &str, notices: &mut Vec<String>) -> Option<String> {
    let Some(storage) = &state.storage else {
        warn!("No object storage configured; keeping image {} by reference.", image_ref);
        notices.push("Image storage is not configured; the image was not uploaded.".to_string());
        return None;
    };

    let data: Bytes = match state.pipeline.images().fetch_image(image_ref).await {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to fetch generated image {}: {}", image_ref, e);
            notices.push(format!("Failed to upload image: {}", e.cause()));
            return None;
        }
    };

    let name = upload_name(id, image_ref);
    match storage.upload(&name, IMAGE_CONTENT_TYPE, data).await {
        Ok(url) => {
            info!("Uploaded hairstyle image as {}.", name);
            Some(url)
        }
        Err(e) => {
            error!("Failed to upload {}: {}", name, e);
            notices.push(format!("Failed to upload image: {}", e.cause()));
            None
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Attribute choices and the session's insights.
#[utoipa::path(
    get,
    path = "/styles/options",
    responses((status = 200, description = "Design options", body = StyleOptions))
)]
pub async fn options_handler(Extension(session): Extension<SharedSession>) -> impl IntoResponse {
    let session = session.lock().await;
    Json(StyleOptions {
        demographics: owned(&DEMOGRAPHICS),
        lengths: owned(&LENGTHS),
        default_length: DEFAULT_LENGTH.to_string(),
        colors: owned(&COLORS),
        braid_types: owned(&BRAID_TYPES),
        insights: session.insights.list().iter().map(|i| i.to_string()).collect(),
        image_prompt: session.image_prompt.clone(),
        generated_hairstyles: session.hairstyles.len(),
    })
}

/// Generates the image prompt for a design.
#[utoipa::path(
    post,
    path = "/styles/prompt",
    request_body = DesignRequest,
    responses(
        (status = 200, description = "The generated prompt", body = ImagePromptResponse)
    )
)]
pub async fn image_prompt_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SharedSession>,
    Json(design): Json<DesignRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let attrs = attributes(design);
    let block = state.pipeline.run(Stage::ImagePrompt, &attrs).await;
    if let ContentBlock::Generated(prompt) = &block {
        session.lock().await.image_prompt = Some(prompt.clone());
    }
    Ok(Json(ImagePromptResponse {
        prompt: block.display_text(Stage::ImagePrompt.label()),
        failed: block.is_failed(),
    }))
}

/// Replaces the session's image prompt with the designer's edit.
#[utoipa::path(
    put,
    path = "/styles/prompt",
    request_body = RefinePromptRequest,
    responses(
        (status = 200, description = "The stored prompt", body = ImagePromptResponse),
        (status = 400, description = "Empty prompt")
    )
)]
pub async fn refine_prompt_handler(
    Extension(session): Extension<SharedSession>,
    Json(request): Json<RefinePromptRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err((StatusCode::BAD_REQUEST, EMPTY_PROMPT.to_string()));
    }
    session.lock().await.image_prompt = Some(prompt.to_string());
    Ok(Json(ImagePromptResponse {
        prompt: prompt.to_string(),
        failed: false,
    }))
}

/// Generates the hairstyle image and the remaining content stages.
#[utoipa::path(
    post,
    path = "/styles/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated hairstyle and content", body = GenerateResponse),
        (status = 400, description = "No prompt to generate from")
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SharedSession>,
    Json(request): Json<GenerateRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    // 1. Resolve attributes and prompt from the request and the session
    let (attrs, prompt) = {
        let session = session.lock().await;
        let attrs = attributes(request.design);
        let prompt = request
            .prompt
            .or_else(|| session.image_prompt.clone())
            .map(|p| p.trim().to_string())
            .unwrap_or_default();
        (attrs, prompt)
    };
    if prompt.is_empty() {
        return Err((StatusCode::BAD_REQUEST, EMPTY_PROMPT.to_string()));
    }

    // 2. Generate the image; the first reference is the one kept
    let mut notices = Vec::new();
    let refs = state.pipeline.generate_image(&prompt).await;
    let hairstyle = match refs.into_iter().next() {
        Some(image_ref) => {
            let id = Uuid::new_v4();
            let public_url = upload_image(&state, id, &image_ref, &mut notices).await;
            Some(GeneratedHairstyle {
                id,
                image_ref,
                image_prompt: prompt.clone(),
                attributes: attrs.clone(),
                public_url,
                created_at: Utc::now(),
            })
        }
        None => {
            notices.push(NO_IMAGE.to_string());
            None
        }
    };

    // 3. The text stages run whether or not an image came back
    let mut package = state.pipeline.run_stages(&Stage::FOLLOW_UP, &attrs).await;
    package
        .blocks
        .insert(Stage::ImagePrompt, ContentBlock::Generated(prompt.clone()));

    // 4. Record the iteration
    let view = hairstyle.as_ref().map(HairstyleView::from);
    let blocks = block_views(Some(&package));
    {
        let mut session = session.lock().await;
        session.image_prompt = Some(prompt);
        if let Some(hairstyle) = hairstyle {
            session.push_hairstyle(hairstyle);
        }
        session.package = Some(package);
    }

    Ok(Json(GenerateResponse {
        hairstyle: view,
        blocks,
        notices,
    }))
}

/// The latest hairstyle and its content.
#[utoipa::path(
    get,
    path = "/styles/latest",
    responses((status = 200, description = "Latest iteration", body = LatestResponse))
)]
pub async fn latest_handler(Extension(session): Extension<SharedSession>) -> impl IntoResponse {
    let session = session.lock().await;
    Json(LatestResponse {
        hairstyle: session.latest_hairstyle().map(HairstyleView::from),
        blocks: block_views(session.package.as_ref()),
        generated_hairstyles: session.hairstyles.len(),
    })
}

/// One content stage as a PDF download.
#[utoipa::path(
    get,
    path = "/styles/report/{stage}",
    params(StagePath),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "Unknown stage or nothing generated yet"),
        (status = 422, description = "Text cannot be encoded in the report font")
    )
)]
pub async fn stage_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SharedSession>,
    Path(path): Path<StagePath>,
) -> Result<impl IntoResponse, HandlerError> {
    let stage = Stage::from_slug(&path.stage)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown stage: {}", path.stage)))?;
    let (doc, name) = {
        let session = session.lock().await;
        let package = session
            .package
            .as_ref()
            .filter(|p| p.block(stage).is_some())
            .ok_or_else(|| (StatusCode::NOT_FOUND, NO_CONTENT.to_string()))?;
        let name = package.attributes.design_name.clone();
        (
            report::build(&stage_report_title(stage, &name), &package.display_text(stage)),
            name,
        )
    };
    pdf_download(
        &state,
        &doc,
        &format!("{}_{}.pdf", file_stem(&name), stage.slug().replace('-', "_")),
    )
}

/// Every stage in one multi-section PDF.
#[utoipa::path(
    get,
    path = "/styles/report",
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "Nothing generated yet"),
        (status = 422, description = "Text cannot be encoded in the report font")
    )
)]
pub async fn launch_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SharedSession>,
) -> Result<impl IntoResponse, HandlerError> {
    let (doc, name) = {
        let session = session.lock().await;
        let package = session
            .package
            .as_ref()
            .ok_or_else(|| (StatusCode::NOT_FOUND, NO_CONTENT.to_string()))?;
        (launch_plan(package), package.attributes.design_name.clone())
    };
    pdf_download(&state, &doc, &format!("{}_launch_plan.pdf", file_stem(&name)))
}

/// Saves the latest hairstyle to My Designs, then keeps its selected insights.
///
/// The two writes are independent; a failed design write does not stop the
/// insights from being mirrored.
#[utoipa::path(
    post,
    path = "/styles/save",
    responses(
        (status = 200, description = "Save outcome", body = SaveResponse),
        (status = 404, description = "No hairstyle generated yet")
    )
)]
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SharedSession>,
) -> Result<impl IntoResponse, HandlerError> {
    let latest = session
        .lock()
        .await
        .latest_hairstyle()
        .cloned()
        .ok_or_else(|| (StatusCode::NOT_FOUND, NO_HAIRSTYLE.to_string()))?;

    let attrs = &latest.attributes;
    let design = SavedDesign {
        design_name: attrs.design_name.clone(),
        image_url: latest.public_url.clone(),
        description: design_description(attrs),
        selected_insights: attrs.selected_insights.clone(),
        image_prompt: latest.image_prompt.clone(),
    };

    let mut notices = Vec::new();
    let design_saved = match state
        .store
        .insert(Table::Designs, records::saved_design_row(&design))
        .await
    {
        Ok(()) => {
            info!("Saved design '{}'.", design.design_name);
            true
        }
        Err(e) => {
            error!("Failed to save design '{}': {}", design.design_name, e);
            notices.push(port_error(e).1);
            false
        }
    };

    let mut insights_added = 0;
    for insight in &design.selected_insights {
        let outcome = keep_insight(&session, state.store.as_ref(), insight).await;
        if outcome.added {
            insights_added += 1;
        }
        if let Some(Err(e)) = outcome.persisted {
            notices.push(format!("Failed to save insight: {}", e.cause()));
        }
    }

    let message = if design_saved {
        format!("Design '{}' saved to My Designs.", design.design_name)
    } else {
        format!("Design '{}' could not be saved.", design.design_name)
    };
    Ok(Json(SaveResponse {
        design_saved,
        message,
        insights_added,
        notices,
    }))
}
