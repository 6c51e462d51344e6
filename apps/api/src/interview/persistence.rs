//! Session snapshot and candidate archive on top of a [`KeyValueStore`].
//!
//! The snapshot is best-effort: failures are logged and reported as `false`,
//! never raised. The archive is append-only; an unreadable archive is never
//! overwritten.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::interview::models::{CandidateResult, InterviewSession};
use crate::store::{KeyValueStore, StoreError};

pub const CANDIDATES_KEY: &str = "interview_candidates";
pub const CURRENT_SESSION_KEY: &str = "interview_current_session";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    session: &'a InterviewSession,
}

#[derive(Deserialize)]
struct SnapshotFile {
    version: u32,
    session: InterviewSession,
}

/// Serializes a session into its snapshot form. Deterministic for equal sessions.
pub fn encode_snapshot(session: &InterviewSession) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        session,
    })?)
}

/// Parses a snapshot. Corrupt text and unknown versions yield `None`.
pub fn decode_snapshot(text: &str) -> Option<InterviewSession> {
    match serde_json::from_str::<SnapshotFile>(text) {
        Ok(file) if file.version == SNAPSHOT_VERSION => Some(file.session),
        Ok(file) => {
            warn!(
                "Ignoring saved session with unsupported version {} (expected {})",
                file.version, SNAPSHOT_VERSION
            );
            None
        }
        Err(e) => {
            warn!("Ignoring unreadable saved session: {}", e);
            None
        }
    }
}

#[derive(Clone)]
pub struct SessionPersistence {
    store: Arc<dyn KeyValueStore>,
}

impl SessionPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    // ── Snapshot ───────────────────────────────────────────────────────────

    /// Overwrites the snapshot. Returns whether it was written.
    pub async fn save_snapshot(&self, session: &InterviewSession) -> bool {
        let text = match encode_snapshot(session) {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not encode session {}: {}", session.id, e);
                return false;
            }
        };
        match self.store.set(CURRENT_SESSION_KEY, &text).await {
            Ok(()) => {
                debug!("Saved snapshot for session {}", session.id);
                true
            }
            Err(e) => {
                warn!("Could not save session {}, it will not be resumable: {}", session.id, e);
                false
            }
        }
    }

    pub async fn load_snapshot(&self) -> Option<InterviewSession> {
        match self.store.get(CURRENT_SESSION_KEY).await {
            Ok(Some(text)) => decode_snapshot(&text),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read saved session: {}", e);
                None
            }
        }
    }

    /// Raw snapshot text as stored, if any.
    pub async fn load_snapshot_text(&self) -> Option<String> {
        self.store.get(CURRENT_SESSION_KEY).await.ok().flatten()
    }

    pub async fn clear_snapshot(&self) -> bool {
        match self.store.remove(CURRENT_SESSION_KEY).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not clear saved session: {}", e);
                false
            }
        }
    }

    // ── Archive ────────────────────────────────────────────────────────────

    async fn read_archive(&self) -> Result<Vec<CandidateResult>, StoreError> {
        match self.store.get(CANDIDATES_KEY).await? {
            None => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
                key: CANDIDATES_KEY.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// All archived results in completion order. Unreadable archives read as empty.
    pub async fn load_archive(&self) -> Vec<CandidateResult> {
        match self.read_archive().await {
            Ok(results) => results,
            Err(e) => {
                error!("Could not load candidate archive: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn append_result(&self, result: &CandidateResult) -> Result<(), StoreError> {
        let mut results = self.read_archive().await?;
        results.push(result.clone());
        let text = serde_json::to_string(&results)?;
        self.store.set(CANDIDATES_KEY, &text).await?;
        info!(
            "Archived result {} for {} ({}%)",
            result.id, result.candidate.name, result.score_percent
        );
        Ok(())
    }

    pub async fn find_result(&self, id: Uuid) -> Option<CandidateResult> {
        self.load_archive().await.into_iter().find(|r| r.id == id)
    }
}
