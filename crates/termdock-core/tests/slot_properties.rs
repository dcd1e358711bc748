//! Property-based tests for slot allocation.
//!
//! Uses proptest to generate random used/available slot partitions and
//! verify allocator invariants.

use std::collections::BTreeSet;

use proptest::prelude::*;

use termdock_core::{
    can_admit, next_available_slot, Session, SessionOrigin, SystemSnapshot, TerminalId,
};

/// Generate a ceiling and a random subset of `1..=max` as used slots.
fn slot_partition() -> impl Strategy<Value = (usize, BTreeSet<usize>)> {
    (1usize..=16).prop_flat_map(|max| {
        let used = proptest::collection::btree_set(1usize..=max, 0..=max);
        (Just(max), used)
    })
}

fn snapshot_from_partition(max: usize, used: &BTreeSet<usize>) -> SystemSnapshot {
    SystemSnapshot {
        sessions: used
            .iter()
            .map(|&slot| {
                Session::new(
                    TerminalId::from_slot(slot),
                    format!("Terminal {slot}"),
                    slot,
                    SessionOrigin::Backend,
                )
            })
            .collect(),
        active_session_id: None,
        max_sessions: max,
        available_slots: (1..=max).filter(|s| !used.contains(s)).collect(),
    }
}

proptest! {
    /// A snapshot built from any partition passes validation.
    #[test]
    fn partition_snapshots_validate((max, used) in slot_partition()) {
        let snapshot = snapshot_from_partition(max, &used);
        prop_assert!(snapshot.validate().is_ok());
    }

    /// The allocator always hands out the minimum available slot.
    #[test]
    fn next_slot_is_minimum_available((max, used) in slot_partition()) {
        let snapshot = snapshot_from_partition(max, &used);
        let expected = (1..=max).find(|s| !used.contains(s));
        prop_assert_eq!(next_available_slot(&snapshot), expected);
    }

    /// The allocated slot is never already in use and never out of range.
    #[test]
    fn next_slot_is_fresh_and_in_range((max, used) in slot_partition()) {
        let snapshot = snapshot_from_partition(max, &used);
        if let Some(slot) = next_available_slot(&snapshot) {
            prop_assert!((1..=max).contains(&slot));
            prop_assert!(!used.contains(&slot));
        } else {
            prop_assert_eq!(used.len(), max);
        }
    }

    /// Admission against a snapshot agrees with slot availability.
    #[test]
    fn admission_matches_availability((max, used) in slot_partition()) {
        let snapshot = snapshot_from_partition(max, &used);
        prop_assert_eq!(
            can_admit(Some(&snapshot), 0, 0, max),
            next_available_slot(&snapshot).is_some()
        );
    }

    /// Fallback admission keeps confirmed + pending below the ceiling.
    #[test]
    fn fallback_admission_respects_ceiling(
        confirmed in 0usize..10,
        pending in 0usize..10,
        max in 1usize..10,
    ) {
        prop_assert_eq!(
            can_admit(None, confirmed, pending, max),
            confirmed + pending < max
        );
    }
}
