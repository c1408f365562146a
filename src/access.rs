//! Ownership gate in front of every session operation.

use crate::id::is_session_id;
use crate::store::{SessionRecord, SessionStore};
use std::sync::Arc;
use thiserror::Error;

/// Reasons a caller is refused access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No caller identity was supplied.
    #[error("Please login to continue")]
    Unauthenticated,

    /// The session is unknown or has been evicted.
    #[error("Session expired or invalid")]
    SessionNotFound(String),

    /// The session belongs to another identity.
    #[error("Unauthorized access to this data")]
    NotOwner(String),
}

/// Authorizes callers against the owner recorded on each session.
///
/// Identities are opaque strings from the authentication layer; they are only
/// ever compared for equality.
#[derive(Debug, Clone)]
pub struct AccessGate {
    store: Arc<SessionStore>,
}

impl AccessGate {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Resolve the caller's identity; blank identities count as absent.
    pub fn authenticate<'a>(&self, caller: Option<&'a str>) -> Result<&'a str, AuthError> {
        caller
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::Unauthenticated)
    }

    /// Check that `caller` owns `session_id` and return its record.
    pub fn authorize(
        &self,
        caller: Option<&str>,
        session_id: &str,
    ) -> Result<Arc<SessionRecord>, AuthError> {
        let caller = self.authenticate(caller)?;

        // Malformed IDs can never name a session; skip the store lock
        let record = is_session_id(session_id)
            .then(|| self.store.get(session_id))
            .flatten()
            .ok_or_else(|| AuthError::SessionNotFound(session_id.to_string()))?;

        if record.owner != caller {
            tracing::warn!(
                tabsight.session_id = %session_id,
                "Rejected access to a session owned by another user"
            );
            return Err(AuthError::NotOwner(session_id.to_string()));
        }

        Ok(record)
    }
}
