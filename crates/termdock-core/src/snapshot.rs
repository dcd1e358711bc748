//! The authoritative backend-pushed view of all sessions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Session, TerminalId};

/// The authoritative view of all sessions, pushed by the backend.
///
/// A snapshot always replaces the coordinator's cache wholesale; it is
/// never mutated in place. Readers holding a reference across an await
/// boundary therefore see a consistent, unchanging view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    /// Sessions currently alive on the backend, in backend order
    #[serde(rename = "terminals")]
    pub sessions: Vec<Session>,
    /// Id of the active session, if any
    #[serde(rename = "activeTerminalId")]
    pub active_session_id: Option<TerminalId>,
    /// Session ceiling enforced by the backend
    #[serde(rename = "maxTerminals")]
    pub max_sessions: usize,
    /// Unused slot numbers in `1..=max_sessions`
    pub available_slots: BTreeSet<usize>,
}

impl SystemSnapshot {
    /// Build an empty snapshot where every slot is available.
    pub fn empty(max_sessions: usize) -> Self {
        Self {
            sessions: Vec::new(),
            active_session_id: None,
            max_sessions,
            available_slots: (1..=max_sessions).collect(),
        }
    }

    /// Look up a session by id.
    pub fn session(&self, id: &TerminalId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Whether a session with this id exists in the snapshot.
    pub fn contains(&self, id: &TerminalId) -> bool {
        self.session(id).is_some()
    }

    /// Check the snapshot's structural invariants.
    ///
    /// - `sessions.len() <= max_sessions`
    /// - available and used slots partition `1..=max_sessions` exactly
    /// - at most one session is marked active
    pub fn validate(&self) -> Result<()> {
        if self.sessions.len() > self.max_sessions {
            return Err(Error::InvalidSnapshot(format!(
                "{} sessions exceed maxTerminals {}",
                self.sessions.len(),
                self.max_sessions
            )));
        }

        let used: BTreeSet<usize> = self.sessions.iter().map(|s| s.slot).collect();
        if used.len() != self.sessions.len() {
            return Err(Error::InvalidSnapshot(
                "duplicate slot assignment".to_string(),
            ));
        }
        if let Some(overlap) = used.intersection(&self.available_slots).next() {
            return Err(Error::InvalidSnapshot(format!(
                "slot {overlap} is both used and available"
            )));
        }

        let all: BTreeSet<usize> = used.union(&self.available_slots).copied().collect();
        let expected: BTreeSet<usize> = (1..=self.max_sessions).collect();
        if all != expected {
            return Err(Error::InvalidSnapshot(format!(
                "slots do not partition 1..={}",
                self.max_sessions
            )));
        }

        let active = self.sessions.iter().filter(|s| s.is_active).count();
        if active > 1 {
            return Err(Error::InvalidSnapshot(format!(
                "{active} sessions marked active"
            )));
        }

        Ok(())
    }
}
