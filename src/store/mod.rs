//! Process-lifetime store of uploaded sessions.

mod bounded_cache;

pub use bounded_cache::BoundedCache;

use crate::datasets::Dataset;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Default number of sessions kept before the oldest is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// One ingested dataset plus the identity that uploaded it.
#[derive(Debug)]
pub struct SessionRecord {
    pub session_id: String,
    pub owner: String,
    pub filename: String,
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
    pub dataset: Dataset,
}

/// Outcome of [`SessionStore::put`].
#[derive(Debug)]
pub struct Inserted {
    pub record: Arc<SessionRecord>,
    /// Sessions dropped to stay within capacity, oldest first.
    pub evicted: Vec<String>,
}

/// Insert-only map from session ID to [`SessionRecord`].
///
/// Records are shared as `Arc`s: every lookup of a session returns the same
/// dataset, never a copy. Once `max_sessions` is reached the oldest session
/// is dropped (FIFO) and later lookups of it miss.
pub struct SessionStore {
    sessions: RwLock<BoundedCache<Arc<SessionRecord>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field(
                "sessions",
                &format!(
                    "{} entries",
                    self.sessions.read().map(|c| c.len()).unwrap_or(0)
                ),
            )
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(BoundedCache::new(max_sessions)),
        }
    }

    /// Register a dataset under `session_id`.
    ///
    /// Returns `None` if the ID is already taken; existing sessions are never
    /// replaced. Sessions evicted to make room are reported in [`Inserted`].
    pub fn put(
        &self,
        session_id: String,
        dataset: Dataset,
        owner: &str,
        filename: &str,
        size_bytes: usize,
    ) -> Option<Inserted> {
        let record = Arc::new(SessionRecord {
            session_id: session_id.clone(),
            owner: owner.to_string(),
            filename: filename.to_string(),
            size_bytes,
            created_at: Utc::now(),
            dataset,
        });

        let evicted = self
            .sessions
            .write()
            .expect("session store lock poisoned")
            .insert_new(session_id, record.clone())
            .ok()?;

        let now = Utc::now();
        let evicted = evicted
            .into_iter()
            .map(|(session_id, old)| {
                tracing::info!(
                    tabsight.session_id = %session_id,
                    age_secs = (now - old.created_at).num_seconds(),
                    "Evicted oldest session to stay within store capacity"
                );
                session_id
            })
            .collect();

        Some(Inserted { record, evicted })
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionRecord>> {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .get(session_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sessions
            .read()
            .expect("session store lock poisoned")
            .capacity()
    }
}
