//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

use design_studio_core::pipeline::{DEFAULT_IMAGE_SEED, DEFAULT_IMAGE_SIZE};

use crate::web::state::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE};

pub const DEFAULT_IMAGE_SPACE_URL: &str =
    "https://llmhacker-realtime-flux-modified-flux-schnell-for-ja-p.hf.space";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which hosted model backs the content generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAi,
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAi),
            other => Err(format!("'{}' is not one of gemini, openai", other)),
        }
    }
}

/// Bucket storage credentials. Uploads are disabled when absent.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub url: String,
    pub key: String,
    pub bucket: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub llm_provider: LlmProvider,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub image_space_url: String,
    pub image_seed: u64,
    pub image_size: u32,
    pub storage: Option<StorageConfig>,
    pub http_timeout_secs: u64,
    pub session_idle_secs: u64,
    pub max_sessions: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:3000".parse().ok())?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generative Providers ---
        let llm_provider = parse_or(&lookup, "LLM_PROVIDER", Some(LlmProvider::Gemini))?;
        let gemini_api_key = lookup("GEMINI_API_KEY");
        let openai_api_key = lookup("OPENAI_API_KEY");
        match llm_provider {
            LlmProvider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigError::MissingVar("GEMINI_API_KEY".to_string()))
            }
            LlmProvider::OpenAi if openai_api_key.is_none() => {
                return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
            }
            _ => {}
        }
        let gemini_model = lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string());
        let gemini_url = lookup("GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string());
        let openai_model = lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        let image_space_url =
            lookup("IMAGE_SPACE_URL").unwrap_or_else(|| DEFAULT_IMAGE_SPACE_URL.to_string());
        let image_seed = parse_or(&lookup, "IMAGE_SEED", Some(DEFAULT_IMAGE_SEED))?;
        let image_size = parse_or(&lookup, "IMAGE_SIZE", Some(DEFAULT_IMAGE_SIZE))?;

        // --- Object Storage (optional) ---
        let storage = match (lookup("STORAGE_URL"), lookup("STORAGE_KEY")) {
            (Some(url), Some(key)) => Some(StorageConfig {
                url: url.trim_end_matches('/').to_string(),
                key,
                bucket: lookup("STORAGE_BUCKET").unwrap_or_else(|| "hairstyle_images".to_string()),
            }),
            _ => None,
        };

        let http_timeout_secs: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECS", Some(60))?;

        // --- Sessions ---
        let session_idle_secs = parse_or(&lookup, "SESSION_IDLE_SECS", Some(DEFAULT_SESSION_IDLE.as_secs()))?;
        let max_sessions = parse_or(&lookup, "MAX_SESSIONS", Some(DEFAULT_MAX_SESSIONS))?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            llm_provider,
            gemini_api_key,
            gemini_model,
            gemini_url,
            openai_api_key,
            openai_model,
            image_space_url: image_space_url.trim_end_matches('/').to_string(),
            image_seed,
            image_size,
            storage,
            http_timeout_secs,
            session_idle_secs,
            max_sessions,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
