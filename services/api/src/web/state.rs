//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of per-browser sessions.

use design_studio_core::ports::{DataStore, ObjectStorage, ReportRenderer};
use design_studio_core::{ContentPipeline, StudioSession};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Sessions)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub pipeline: Arc<ContentPipeline>,
    /// `None` when no bucket is configured; generated images are then kept by reference only.
    pub storage: Option<Arc<dyn ObjectStorage>>,
    pub renderer: Arc<dyn ReportRenderer>,
    pub sessions: SessionRegistry,
}

//=========================================================================================
// Sessions (One Per Browser)
//=========================================================================================

/// A session handed to handlers through a request extension.
pub type SharedSession = Arc<Mutex<StudioSession>>;

/// Sessions untouched for this long are dropped.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(2 * 60 * 60);
/// Upper bound on live sessions; the least recently used one is dropped first.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
    /// Position in use order, larger is more recent.
    tick: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<Uuid, SessionEntry>,
    tick: u64,
}

impl Sessions {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

pub struct SessionRegistry {
    sessions: RwLock<Sessions>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_IDLE, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that expires sessions idle for `idle_ttl` and never holds
    /// more than `max_sessions` (at least one).
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(Sessions::default()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Returns the session for `id`, or opens a new one when `id` is unknown
    /// or has expired. The flag is `true` when a session was created.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, SharedSession, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if let Some(id) = id {
            let tick = sessions.next_tick();
            if let Some(entry) = sessions.entries.get_mut(&id) {
                if now.duration_since(entry.last_seen) < self.idle_ttl {
                    entry.last_seen = now;
                    entry.tick = tick;
                    return (id, entry.session.clone(), false);
                }
                info!("Session {} expired.", id);
            }
        }

        self.make_room(&mut sessions, now);
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(StudioSession::new(id)));
        let tick = sessions.next_tick();
        sessions.entries.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: now,
                tick,
            },
        );
        (id, session, true)
    }

    /// Drops idle sessions, then the least recently used ones until a new
    /// session fits under the cap.
    fn make_room(&self, sessions: &mut Sessions, now: Instant) {
        let before = sessions.entries.len();
        sessions
            .entries
            .retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_ttl);

        while sessions.entries.len() >= self.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.tick)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    sessions.entries.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - sessions.entries.len();
        if dropped > 0 {
            info!("Dropped {} stale session(s).", dropped);
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.entries.len()
    }
}
