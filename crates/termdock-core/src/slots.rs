//! Pure slot allocation over a snapshot.
//!
//! These functions carry no state of their own; everything they decide
//! is derived from the arguments, so callers can reason about admission
//! without locking anything.

use crate::SystemSnapshot;

/// The lowest unused slot in the snapshot, or `None` when full.
pub fn next_available_slot(snapshot: &SystemSnapshot) -> Option<usize> {
    snapshot.available_slots.iter().next().copied()
}

/// Whether a new session may be admitted.
///
/// With a cached snapshot the backend's `available_slots` set is the
/// source of truth. Before the first snapshot arrives the local count of
/// confirmed sessions plus in-flight creations is checked against the
/// configured ceiling instead.
pub fn can_admit(
    snapshot: Option<&SystemSnapshot>,
    confirmed_count: usize,
    pending_count: usize,
    fallback_max: usize,
) -> bool {
    match snapshot {
        Some(snapshot) => !snapshot.available_slots.is_empty(),
        None => confirmed_count + pending_count < fallback_max,
    }
}
