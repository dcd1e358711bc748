//! Safety rules between the session lifecycle and the display layout.

use std::sync::Arc;

use tracing::debug;

use crate::hooks::LayoutControl;

/// The display modes the layout state machine can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Single terminal, standard chrome
    Normal,
    /// One terminal filling the panel
    Fullscreen,
    /// All terminals tiled side by side
    Split,
}

/// Keeps lifecycle operations from interacting unsafely with the layout
/// state machine.
///
/// Creating into a stale fullscreen view or deleting the one visible
/// fullscreen session would leave the renderer pointing at a container
/// that no longer matches the session set; the guard forces a split
/// transition first in both cases.
pub struct LayoutModeGuard {
    layout: Arc<dyn LayoutControl>,
}

impl LayoutModeGuard {
    /// Wrap the injected layout control.
    pub fn new(layout: Arc<dyn LayoutControl>) -> Self {
        Self { layout }
    }

    /// Make the layout safe for an additional session, waiting for the
    /// transition to settle before the caller proceeds.
    ///
    /// A fullscreen view with existing sessions cannot absorb a new one;
    /// transition to split and wait until the layout reports settled.
    /// In any other mode this resolves immediately with no side effect.
    pub async fn ensure_safe_before_create(&self, existing_count: usize) {
        if self.layout.current_mode() == LayoutMode::Fullscreen && existing_count > 0 {
            debug!("Leaving fullscreen before creating session {}", existing_count + 1);
            self.layout.set_mode(LayoutMode::Split);
            self.layout.await_settled().await;
        }
    }

    /// Make the layout safe before a delete request is sent.
    ///
    /// If more than one session will remain, a fullscreen view must drop
    /// to split synchronously so the UI never renders a fullscreen
    /// container for a session about to disappear.
    pub fn prepare_for_delete(&self, remaining_count: usize) {
        if remaining_count > 1 && self.layout.current_mode() == LayoutMode::Fullscreen {
            debug!("Leaving fullscreen before delete, {remaining_count} sessions remain");
            self.layout.set_mode(LayoutMode::Split);
        }
    }

    /// Re-balance the split grid after a session change, if split is the
    /// current mode.
    pub fn refresh_split(&self) {
        if self.layout.current_mode() == LayoutMode::Split {
            self.layout.show_all_split();
        }
    }
}
