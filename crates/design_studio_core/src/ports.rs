//! crates/design_studio_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the studio's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted database, the generative APIs and the
//! document format used for exports.

use async_trait::async_trait;
use bytes::Bytes;

use crate::report::Report;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Missing expected column: {0}")]
    MissingColumn(String),
    #[error("Upstream service failed: {0}")]
    Upstream(String),
    #[error("No usable image in the generator response")]
    NoImage,
    #[error("Text cannot be encoded for export: {0}")]
    Encoding(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Coarse classification of a [`PortError`], kept alongside degraded results
/// so callers can branch without inspecting message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    MissingColumn,
    Upstream,
    NoImage,
    Encoding,
    Unexpected,
}

impl PortError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortError::NotFound(_) => ErrorKind::NotFound,
            PortError::MissingColumn(_) => ErrorKind::MissingColumn,
            PortError::Upstream(_) => ErrorKind::Upstream,
            PortError::NoImage => ErrorKind::NoImage,
            PortError::Encoding(_) => ErrorKind::Encoding,
            PortError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// The underlying cause without the variant prefix.
    pub fn cause(&self) -> String {
        match self {
            PortError::NotFound(msg)
            | PortError::MissingColumn(msg)
            | PortError::Upstream(msg)
            | PortError::Encoding(msg)
            | PortError::Unexpected(msg) => msg.clone(),
            PortError::NoImage => self.to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Remote Data Store
//=========================================================================================

/// A table row as returned by the store: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The tables this system reads from or appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    GeoMap,
    MultiTimeline,
    RelatedQueries,
    RelatedEntities,
    CompetitorProducts,
    DesignerInsights,
    Designs,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::GeoMap => "brd_gtrends_geomap",
            Table::MultiTimeline => "brd_gtrends_multitimeline",
            Table::RelatedQueries => "brd_gtrends_relatedqueries",
            Table::RelatedEntities => "brd_gtrends_relatedentities",
            Table::CompetitorProducts => "brd_outre_products",
            Table::DesignerInsights => "brd_gtrends_designer_insights",
            Table::Designs => "brd_design",
        }
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    /// Reads every row of `table`, optionally projected onto `columns`.
    ///
    /// A projected column that the table does not have is reported as
    /// [`PortError::MissingColumn`].
    async fn select(&self, table: Table, columns: Option<&[&str]>) -> PortResult<Vec<Row>>;

    /// Appends one row to `table`.
    async fn insert(&self, table: Table, row: Row) -> PortResult<()>;
}

//=========================================================================================
// Generative Services
//=========================================================================================

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Sends a natural-language prompt and returns the generated text.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

/// Parameters of one image generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates images for a prompt and returns their references in order.
    /// Implementations normalize whatever shape the remote model answers with.
    async fn generate_image(&self, request: &ImageRequest) -> PortResult<Vec<String>>;

    /// Fetches the bytes behind a reference returned by `generate_image`.
    async fn fetch_image(&self, reference: &str) -> PortResult<Bytes>;
}

//=========================================================================================
// Object Storage and Export
//=========================================================================================

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads `data` under `name` in the configured bucket and returns its public URL.
    async fn upload(&self, name: &str, content_type: &str, data: Bytes) -> PortResult<String>;
}

pub trait ReportRenderer: Send + Sync {
    /// Serializes a laid-out report into a downloadable document.
    fn render(&self, report: &Report) -> PortResult<Vec<u8>>;
}
