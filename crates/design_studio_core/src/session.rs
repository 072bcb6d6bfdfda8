//! crates/design_studio_core/src/session.rs
//!
//! The state owned by one user session. Each session gets its own context
//! object; nothing in here is shared between sessions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DesignPackage, GeneratedHairstyle};
use crate::insights::InsightAccumulator;

#[derive(Debug)]
pub struct StudioSession {
    pub id: Uuid,
    pub insights: InsightAccumulator,
    /// Append-only; the last entry is the one downloads and saves operate on.
    pub hairstyles: Vec<GeneratedHairstyle>,
    /// The most recent image prompt, possibly edited by the designer.
    pub image_prompt: Option<String>,
    /// Content generated for the most recent hairstyle.
    pub package: Option<DesignPackage>,
    pub created_at: DateTime<Utc>,
}

impl StudioSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            insights: InsightAccumulator::new(),
            hairstyles: Vec::new(),
            image_prompt: None,
            package: None,
            created_at: Utc::now(),
        }
    }

    pub fn latest_hairstyle(&self) -> Option<&GeneratedHairstyle> {
        self.hairstyles.last()
    }

    pub fn push_hairstyle(&mut self, hairstyle: GeneratedHairstyle) {
        self.hairstyles.push(hairstyle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DesignAttributes;

    fn hairstyle(name: &str) -> GeneratedHairstyle {
        GeneratedHairstyle {
            id: Uuid::new_v4(),
            image_ref: format!("{name}.webp"),
            image_prompt: String::new(),
            attributes: DesignAttributes {
                design_name: name.to_string(),
                ..Default::default()
            },
            public_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn hairstyles_append_and_latest_wins() {
        let mut session = StudioSession::new(Uuid::new_v4());
        assert!(session.latest_hairstyle().is_none());

        session.push_hairstyle(hairstyle("first"));
        session.push_hairstyle(hairstyle("second"));

        assert_eq!(session.hairstyles.len(), 2);
        assert_eq!(session.latest_hairstyle().unwrap().attributes.design_name, "second");
    }

    #[test]
    fn sessions_do_not_share_insights() {
        let mut a = StudioSession::new(Uuid::new_v4());
        let b = StudioSession::new(Uuid::new_v4());
        a.insights.record("only in a");
        assert_eq!(a.insights.len(), 1);
        assert!(b.insights.is_empty());
    }
}
