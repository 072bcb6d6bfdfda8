//! crates/design_studio_core/src/domain.rs
//!
//! Defines the pure, core data structures for the design studio.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::ports::ErrorKind;

/// A single free-text remark a designer chose to keep.
///
/// An insight has no identity beyond its text; two insights are the same
/// insight exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Insight(String);

impl Insight {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The attributes a designer supplies for one design iteration.
///
/// Every content pipeline call is keyed by the full tuple, so the struct is
/// hashable and compared field by field (insight order included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DesignAttributes {
    pub design_name: String,
    pub demographic: String,
    pub length: String,
    pub color: String,
    pub braid_type: String,
    pub style_note: String,
    pub selected_insights: Vec<String>,
}

/// One stage of the design content pipeline, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    ImagePrompt,
    LookAndFeel,
    Marketing,
    Packaging,
    ManufacturingCost,
    CustomerCost,
    Formulation,
    Visuals,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::ImagePrompt,
        Stage::LookAndFeel,
        Stage::Marketing,
        Stage::Packaging,
        Stage::ManufacturingCost,
        Stage::CustomerCost,
        Stage::Formulation,
        Stage::Visuals,
    ];

    /// The stages generated once an image exists, i.e. everything but the prompt.
    pub const FOLLOW_UP: [Stage; 7] = [
        Stage::LookAndFeel,
        Stage::Marketing,
        Stage::Packaging,
        Stage::ManufacturingCost,
        Stage::CustomerCost,
        Stage::Formulation,
        Stage::Visuals,
    ];

    /// URL-safe identifier.
    pub fn slug(self) -> &'static str {
        match self {
            Stage::ImagePrompt => "image-prompt",
            Stage::LookAndFeel => "look-and-feel",
            Stage::Marketing => "marketing",
            Stage::Packaging => "packaging",
            Stage::ManufacturingCost => "manufacturing-cost",
            Stage::CustomerCost => "customer-cost",
            Stage::Formulation => "formulation",
            Stage::Visuals => "visuals",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.slug() == slug)
    }

    /// Lower-case noun phrase used in failure messages.
    pub fn label(self) -> &'static str {
        match self {
            Stage::ImagePrompt => "image generation prompt",
            Stage::LookAndFeel => "look and feel",
            Stage::Marketing => "marketing plan",
            Stage::Packaging => "packaging plan",
            Stage::ManufacturingCost => "manufacturing costs",
            Stage::CustomerCost => "customer costs",
            Stage::Formulation => "formulation details",
            Stage::Visuals => "visuals",
        }
    }

    /// Section heading used in reports.
    pub fn title(self) -> &'static str {
        match self {
            Stage::ImagePrompt => "Image Generation Prompt",
            Stage::LookAndFeel => "Look and Feel",
            Stage::Marketing => "Marketing Plan",
            Stage::Packaging => "Packaging Plan",
            Stage::ManufacturingCost => "Manufacturing Costs",
            Stage::CustomerCost => "Customer Costs",
            Stage::Formulation => "Formulation Details",
            Stage::Visuals => "Design Visuals",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// The outcome of one generative call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Generated(String),
    Failed { kind: ErrorKind, message: String },
}

impl ContentBlock {
    pub fn is_failed(&self) -> bool {
        matches!(self, ContentBlock::Failed { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ContentBlock::Generated(text) => Some(text),
            ContentBlock::Failed { .. } => None,
        }
    }

    /// Renders the block for display, substituting a readable placeholder
    /// for failures so every block can be shown or exported unconditionally.
    pub fn display_text(&self, what: &str) -> String {
        match self {
            ContentBlock::Generated(text) => text.clone(),
            ContentBlock::Failed { message, .. } => {
                format!("Error generating {}: {}", what, message)
            }
        }
    }
}

/// All generated blocks for one attribute tuple.
#[derive(Debug, Clone)]
pub struct DesignPackage {
    pub attributes: DesignAttributes,
    pub blocks: BTreeMap<Stage, ContentBlock>,
}

impl DesignPackage {
    pub fn new(attributes: DesignAttributes) -> Self {
        Self {
            attributes,
            blocks: BTreeMap::new(),
        }
    }

    pub fn block(&self, stage: Stage) -> Option<&ContentBlock> {
        self.blocks.get(&stage)
    }

    /// Display text for a stage; empty when the stage has not run yet.
    pub fn display_text(&self, stage: Stage) -> String {
        self.blocks
            .get(&stage)
            .map(|block| block.display_text(stage.label()))
            .unwrap_or_default()
    }
}

/// One entry of the session's append-only generated hairstyle list.
#[derive(Debug, Clone)]
pub struct GeneratedHairstyle {
    pub id: Uuid,
    /// The reference returned by the image generator.
    pub image_ref: String,
    pub image_prompt: String,
    pub attributes: DesignAttributes,
    /// Public URL in object storage, if the upload succeeded.
    pub public_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A read-only product row from a competitor catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorProduct {
    pub name: String,
    pub link: String,
    pub category: String,
    pub subcategory: String,
    pub quantity: f64,
    pub length: String,
    pub modified: String,
    pub description: String,
    pub image_url: String,
}

/// One sample of the search-interest timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub keyword: String,
    pub time: String,
    pub date: String,
    pub interest: f64,
}

/// Search interest for one region or state.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInterest {
    pub region: String,
    pub interest: f64,
}

/// A related query or related topic from the trends tables.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedTerm {
    pub term: String,
    /// `TOP` or `RISING`.
    pub category: String,
    pub interest: f64,
    pub growth: f64,
}

/// A design record as written to the saved-design table.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedDesign {
    pub design_name: String,
    pub image_url: Option<String>,
    pub description: String,
    pub selected_insights: Vec<String>,
    pub image_prompt: String,
}
