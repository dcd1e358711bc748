//! # termdock-coordinator
//!
//! Session lifecycle coordination for termdock.
//!
//! This crate provides:
//! - Idempotent, capacity-limited session creation
//! - Deletion tracking with snapshot-based confirmation
//! - Queueing of creation requests behind in-flight deletions
//! - Layout-mode safety around lifecycle changes
//! - Reconciliation of local optimistic state against backend snapshots
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on termdock-core
//! for types and exposes the [`LifecycleCoordinator`] façade plus the
//! capability traits a host must implement to wire it up.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod deletion;
pub mod hooks;
pub mod layout;
pub mod pending;

// Re-export commonly used types
pub use coordinator::{Collaborators, CoordinatorStatus, LifecycleCoordinator};
pub use deletion::DeletionSynchronizer;
pub use hooks::{
    BackendChannel, CreationService, LayoutControl, NotificationHooks, PersistenceHooks,
    RemovalService, TabHooks,
};
pub use layout::{LayoutMode, LayoutModeGuard};
pub use pending::{PendingOperationTracker, QueuedCreation};
