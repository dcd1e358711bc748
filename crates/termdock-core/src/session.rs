//! Session identity and session record types.

use serde::{Deserialize, Serialize};

/// Unique identifier for a terminal session.
///
/// Identifiers are slot-derived and stable per numeric slot
/// (`terminal-1`, `terminal-2`, ...), so the same slot always maps to
/// the same id on both sides of the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalId(String);

impl TerminalId {
    /// Build the canonical id for a numeric slot.
    pub fn from_slot(slot: usize) -> Self {
        Self(format!("terminal-{slot}"))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the slot number out of a canonical id, if it has one.
    pub fn slot_number(&self) -> Option<usize> {
        self.0.strip_prefix("terminal-")?.parse().ok()
    }
}

impl From<String> for TerminalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TerminalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TerminalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the channel initiated a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    /// Initiated by a user action in the front-end
    Ui,
    /// Initiated (or confirmed) by the backend
    Backend,
}

/// A terminal session as the coordinator sees it.
///
/// Sessions are created only by a confirmed backend response or,
/// transiently, as an optimistic local placeholder while a creation is
/// in flight; they are destroyed when absent from a subsequent
/// authoritative snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier, stable per slot
    pub id: TerminalId,
    /// Human-readable name shown in the UI
    pub display_name: String,
    /// Numeric slot in `1..=max_sessions`
    pub slot: usize,
    /// Whether this is the active (focused) session
    pub is_active: bool,
    /// Which side initiated the session
    pub origin: SessionOrigin,
}

impl Session {
    /// Create a new session record.
    pub fn new(
        id: TerminalId,
        display_name: impl Into<String>,
        slot: usize,
        origin: SessionOrigin,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            slot,
            is_active: false,
            origin,
        }
    }
}

/// Launch parameters handed opaquely to the creation service.
///
/// The coordinator never interprets these; they exist so callers can
/// carry shell/profile choices through the lifecycle seam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminalLaunchConfig {
    /// Shell command to execute (e.g., "/bin/bash", "powershell.exe")
    pub shell: String,
    /// Working directory for the session
    pub working_directory: Option<String>,
    /// Environment variables
    pub env: Vec<(String, String)>,
}

impl Default for TerminalLaunchConfig {
    fn default() -> Self {
        Self {
            shell: if cfg!(windows) {
                "powershell.exe".to_string()
            } else {
                "/bin/bash".to_string()
            },
            working_directory: None,
            env: Vec::new(),
        }
    }
}
