//! Tracking of in-flight deletions until a snapshot confirms them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use termdock_core::{SystemSnapshot, TerminalId};

/// One deletion awaiting backend confirmation.
#[derive(Debug, Clone, Copy)]
struct DeletionTrackingEntry {
    tracked_at: Instant,
    expires_at: Instant,
}

/// Tracks deletion requests until a backend snapshot proves them
/// complete.
///
/// While an id is tracked, slot allocation for it is considered unsafe:
/// the backend may not have freed the slot yet. Entries auto-clear
/// after a bounded timeout so a lost confirmation can never lock the
/// coordinator out of creating terminals permanently; the auto-clear
/// optimistically assumes the deletion succeeded, which a merely-slow
/// backend can falsify (accepted trade-off, see DESIGN.md).
#[derive(Debug)]
pub struct DeletionSynchronizer {
    tracked: Mutex<HashMap<TerminalId, DeletionTrackingEntry>>,
    timeout: Duration,
}

impl DeletionSynchronizer {
    /// Create a synchronizer whose entries auto-clear after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            tracked: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Start tracking a deletion. Returns `false` if the id is already
    /// tracked and unexpired (double-delete).
    pub fn track(&self, id: &TerminalId) -> bool {
        let now = Instant::now();
        let mut tracked = self.tracked.lock().unwrap();
        Self::reap_locked(&mut tracked, now);
        if tracked.contains_key(id) {
            return false;
        }
        tracked.insert(
            id.clone(),
            DeletionTrackingEntry {
                tracked_at: now,
                expires_at: now + self.timeout,
            },
        );
        debug!("Tracking deletion of {id}");
        true
    }

    /// Whether a deletion for this id is still awaiting confirmation.
    pub fn is_tracked(&self, id: &TerminalId) -> bool {
        let mut tracked = self.tracked.lock().unwrap();
        Self::reap_locked(&mut tracked, Instant::now());
        tracked.contains_key(id)
    }

    /// Whether any deletion is awaiting confirmation.
    pub fn any_tracked(&self) -> bool {
        let mut tracked = self.tracked.lock().unwrap();
        Self::reap_locked(&mut tracked, Instant::now());
        !tracked.is_empty()
    }

    /// Ids currently awaiting confirmation.
    pub fn tracked_ids(&self) -> Vec<TerminalId> {
        let mut tracked = self.tracked.lock().unwrap();
        Self::reap_locked(&mut tracked, Instant::now());
        tracked.keys().cloned().collect()
    }

    /// Stop tracking an id without confirmation (e.g., the delete
    /// request never reached the backend).
    pub fn untrack(&self, id: &TerminalId) {
        self.tracked.lock().unwrap().remove(id);
    }

    /// Match tracked deletions against an authoritative snapshot.
    ///
    /// Every tracked id absent from the snapshot is confirmed complete
    /// and returned; ids still present remain tracked, their deletion
    /// presumed still in flight on the backend.
    pub fn reconcile(&self, snapshot: &SystemSnapshot) -> Vec<TerminalId> {
        let mut tracked = self.tracked.lock().unwrap();
        Self::reap_locked(&mut tracked, Instant::now());

        let confirmed: Vec<TerminalId> = tracked
            .keys()
            .filter(|id| !snapshot.contains(id))
            .cloned()
            .collect();
        for id in &confirmed {
            tracked.remove(id);
            debug!("Snapshot confirmed deletion of {id}");
        }
        confirmed
    }

    /// Drop all tracking state. Returns how many entries were cleared.
    pub fn clear_all(&self) -> usize {
        let mut tracked = self.tracked.lock().unwrap();
        let count = tracked.len();
        tracked.clear();
        count
    }

    fn reap_locked(tracked: &mut HashMap<TerminalId, DeletionTrackingEntry>, now: Instant) {
        tracked.retain(|id, entry| {
            if now >= entry.expires_at {
                warn!(
                    "Deletion of {id} unconfirmed after {:?}, assuming completion",
                    now.duration_since(entry.tracked_at)
                );
                false
            } else {
                true
            }
        });
    }
}
