//! crates/design_studio_core/src/insights.rs
//!
//! The per-session list of designer insights and the mirror write that
//! follows each new addition.

use serde_json::json;
use tracing::{error, info};

use crate::domain::Insight;
use crate::ports::{DataStore, PortResult, Row, Table};

/// What happened when an insight was offered to the accumulator.
#[derive(Debug)]
pub struct InsightAdded {
    /// `false` when the text was already in the session list.
    pub added: bool,
    /// Outcome of the remote mirror write. `None` when nothing was written.
    pub persisted: Option<PortResult<()>>,
}

impl InsightAdded {
    /// The text was already kept; nothing was written.
    pub fn duplicate() -> Self {
        Self {
            added: false,
            persisted: None,
        }
    }

    pub fn mirror_failed(&self) -> bool {
        matches!(self.persisted, Some(Err(_)))
    }
}

/// Ordered, deduplicated collection of the insights kept during one session.
#[derive(Debug, Default, Clone)]
pub struct InsightAccumulator {
    items: Vec<Insight>,
}

impl InsightAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.items.iter().any(|item| item.as_str() == text)
    }

    /// Appends `text` to the session list unless it is already present.
    /// Returns whether the list changed.
    pub fn record(&mut self, text: &str) -> bool {
        if self.contains(text) {
            return false;
        }
        self.items.push(Insight::new(text));
        true
    }

    pub fn list(&self) -> &[Insight] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Writes a newly recorded insight into the insights table.
///
/// Runs after [`InsightAccumulator::record`] accepted `text`; a failed insert
/// is reported in the returned value but the local append is kept.
pub async fn mirror(text: &str, store: &dyn DataStore) -> InsightAdded {
    let persisted = store.insert(Table::DesignerInsights, insight_row(text)).await;
    match &persisted {
        Ok(()) => info!("Insight mirrored to {}.", Table::DesignerInsights.name()),
        Err(e) => error!("Failed to mirror insight to the store: {}", e),
    }
    InsightAdded {
        added: true,
        persisted: Some(persisted),
    }
}

fn insight_row(text: &str) -> Row {
    let mut row = Row::new();
    row.insert("insight".to_string(), json!(text));
    row
}
