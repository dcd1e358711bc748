//! Capability interfaces the coordinator consumes.
//!
//! Everything the coordinator needs from the outside world goes through
//! one of these narrow traits, injected as `Arc<dyn ...>` at the
//! composition root. Tests substitute recording doubles; production
//! wires the real renderer, persistence layer and channel transport.

use async_trait::async_trait;

use termdock_core::{OutboundMessage, Result, Session, TerminalId, TerminalLaunchConfig};

use crate::layout::LayoutMode;

/// Constructs the actual terminal session (view, process wiring).
#[async_trait]
pub trait CreationService: Send + Sync {
    /// Build the session for `id`. Returns `Ok(None)` when construction
    /// fails in a way the user has already been told about.
    async fn create(
        &self,
        id: &TerminalId,
        display_name: &str,
        launch: &TerminalLaunchConfig,
        slot_hint: Option<usize>,
    ) -> Result<Option<Session>>;
}

/// Tears down the local rendering/state for a session.
#[async_trait]
pub trait RemovalService: Send + Sync {
    /// Remove the session locally. Returns whether anything was removed.
    async fn remove(&self, id: &TerminalId) -> Result<bool>;
}

/// The display-layout state machine the coordinator must stay safe with.
#[async_trait]
pub trait LayoutControl: Send + Sync {
    /// The layout mode currently rendered.
    fn current_mode(&self) -> LayoutMode;

    /// Request a transition to the given mode.
    fn set_mode(&self, mode: LayoutMode);

    /// Re-balance the split grid across all sessions.
    fn show_all_split(&self);

    /// Resolve once the pending layout transition has settled.
    ///
    /// Implementations backed by a layout engine with a completion
    /// signal should resolve on that signal; a fixed short delay is an
    /// acceptable fallback where no such signal exists.
    async fn await_settled(&self);
}

/// Debounced persistence of the session arrangement.
pub trait PersistenceHooks: Send + Sync {
    /// Schedule a debounced save of the current session state.
    fn save_session_debounced(&self);
}

/// User-facing notifications.
pub trait NotificationHooks: Send + Sync {
    /// Show a non-fatal warning to the user.
    fn warn(&self, message: &str);
}

/// Tab-strip registration for sessions.
pub trait TabHooks: Send + Sync {
    /// Register a tab for a newly created session.
    fn add_tab(&self, session: &Session);

    /// Remove the tab for a session.
    fn remove_tab(&self, id: &TerminalId);

    /// Highlight the tab for the active session.
    fn set_active_tab(&self, id: &TerminalId);
}

/// The asynchronous message channel to the backend process.
#[async_trait]
pub trait BackendChannel: Send + Sync {
    /// Send one message. Delivery is fire-and-forget; correlation with
    /// any backend reaction happens via terminal ids and snapshots.
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}
