//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        BucketStorageAdapter, DbAdapter, GeminiContentAdapter, GradioImageAdapter,
        OpenAiContentAdapter, PdfReportAdapter,
    },
    config::{Config, LlmProvider},
    error::ApiError,
    web::{
        rest::ApiDoc,
        router,
        state::{AppState, SessionRegistry},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{header::CONTENT_TYPE, Method};
use axum::Router;
use design_studio_core::ports::{ContentGenerator, ObjectStorage};
use design_studio_core::{ContentPipeline, ImageSettings};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Data Store ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(DbAdapter::new(db_pool));

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let generator: Arc<dyn ContentGenerator> = match config.llm_provider {
        LlmProvider::Gemini => {
            let key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| ApiError::Internal("GEMINI_API_KEY is required".to_string()))?;
            info!("Using Gemini model {}.", config.gemini_model);
            Arc::new(GeminiContentAdapter::new(
                http.clone(),
                config.gemini_url.clone(),
                key,
                config.gemini_model.clone(),
            ))
        }
        LlmProvider::OpenAi => {
            let key = config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?;
            info!("Using OpenAI model {}.", config.openai_model);
            let client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            Arc::new(OpenAiContentAdapter::new(client, config.openai_model.clone()))
        }
    };

    let images = Arc::new(GradioImageAdapter::new(
        http.clone(),
        config.image_space_url.clone(),
    ));

    let storage: Option<Arc<dyn ObjectStorage>> = match config.storage.clone() {
        Some(storage) => {
            info!("Uploading generated images to bucket '{}'.", storage.bucket);
            Some(Arc::new(BucketStorageAdapter::new(http.clone(), storage)))
        }
        None => {
            warn!("STORAGE_URL/STORAGE_KEY not set; generated images will not be uploaded.");
            None
        }
    };

    let pipeline = Arc::new(ContentPipeline::new(
        generator,
        images,
        ImageSettings {
            seed: config.image_seed,
            size: config.image_size,
        },
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        pipeline,
        storage,
        renderer: Arc::new(PdfReportAdapter::new()),
        sessions: SessionRegistry::with_limits(
            Duration::from_secs(config.session_idle_secs),
            config.max_sessions,
        ),
    });

    // --- 5. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
