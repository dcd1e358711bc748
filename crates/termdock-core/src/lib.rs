//! # termdock-core
//!
//! Core types for the termdock session lifecycle coordinator.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other termdock crates. It provides:
//!
//! - Terminal identity and session types (TerminalId, Session, SessionOrigin)
//! - The authoritative system snapshot pushed by the backend
//! - Pure slot allocation over a snapshot
//! - Protocol messages for the front-end/backend channel
//! - Coordinator configuration
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other termdock crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all modules
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod slots;
pub mod snapshot;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use error::{Error, Result};
pub use protocol::{InboundMessage, OutboundMessage};
pub use session::{Session, SessionOrigin, TerminalId, TerminalLaunchConfig};
pub use slots::{can_admit, next_available_slot};
pub use snapshot::SystemSnapshot;
