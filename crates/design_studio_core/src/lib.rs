pub mod analytics;
pub mod domain;
pub mod insights;
pub mod pipeline;
pub mod ports;
pub mod prompts;
pub mod records;
pub mod report;
pub mod session;

pub use domain::{
    CompetitorProduct, ContentBlock, DesignAttributes, DesignPackage, GeneratedHairstyle, Insight,
    RegionInterest, RelatedTerm, SavedDesign, Stage, TrendPoint,
};
pub use insights::{InsightAccumulator, InsightAdded};
pub use pipeline::{ContentPipeline, ImageSettings};
pub use ports::{
    ContentGenerator, DataStore, ErrorKind, ImageGenerator, ImageRequest, ObjectStorage,
    PortError, PortResult, ReportRenderer, Row, Table,
};
pub use report::Report;
pub use session::StudioSession;
