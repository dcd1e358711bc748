//! Messages exchanged with the backend over the channel.
//!
//! The channel is asynchronous and bidirectional with no
//! request/response correlation id; correlation happens by terminal id
//! and by watching subsequent state pushes. Every message carries a
//! `command` discriminator on the wire.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{SessionOrigin, SystemSnapshot, TerminalId};

/// Messages the front-end sends to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Ask the backend to create a terminal on a specific slot-derived id.
    #[serde(rename_all = "camelCase")]
    CreateTerminal {
        /// Slot-derived id the new terminal should occupy
        terminal_id: TerminalId,
        /// Display name for the new terminal
        terminal_name: String,
        /// Milliseconds since the UNIX epoch, UTC
        timestamp: i64,
    },
    /// Ask the backend to tear down a terminal.
    #[serde(rename_all = "camelCase")]
    DeleteTerminal {
        /// Id of the terminal to delete
        terminal_id: TerminalId,
        /// Which side asked for the deletion
        request_source: SessionOrigin,
        /// Milliseconds since the UNIX epoch, UTC
        timestamp: i64,
    },
    /// Ask the backend for a fresh state push.
    RequestState {},
}

impl OutboundMessage {
    /// Build a `createTerminal` message stamped with the current time.
    pub fn create_terminal(terminal_id: TerminalId, terminal_name: impl Into<String>) -> Self {
        Self::CreateTerminal {
            terminal_id,
            terminal_name: terminal_name.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Build a `deleteTerminal` message stamped with the current time.
    pub fn delete_terminal(terminal_id: TerminalId, request_source: SessionOrigin) -> Self {
        Self::DeleteTerminal {
            terminal_id,
            request_source,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Build a `requestState` message.
    pub fn request_state() -> Self {
        Self::RequestState {}
    }
}

/// Messages the backend pushes to the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Authoritative state push replacing the cached snapshot wholesale.
    StateUpdate {
        /// The snapshot payload, flattened into the message body
        #[serde(flatten)]
        snapshot: SystemSnapshot,
    },
}
