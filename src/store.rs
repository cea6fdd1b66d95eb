//! Persistence boundary for booking state changes.
//!
//! Matchers work on an in-memory snapshot; the store receives the
//! resulting state changes as bulk updates and makes them durable in a
//! single commit. Updates staged before `commit` are not observable as
//! final, so a crashed run leaves the previous states intact.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::BookingState;

/// Sink for the state changes of a completed run.
pub trait BookingStore {
    /// Stages a state change for every id in `ids`. An empty set is a
    /// no-op.
    fn update_states(&mut self, ids: &BTreeSet<String>, state: BookingState);

    /// Makes all staged changes durable atomically.
    fn commit(&mut self);
}

/// In-memory store, used in tests and for dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pending: BTreeMap<String, BookingState>,
    committed: BTreeMap<String, BookingState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed state of a booking, if any run touched it.
    pub fn state_of(&self, booking_id: &str) -> Option<BookingState> {
        self.committed.get(booking_id).copied()
    }

    /// Number of staged, not yet committed changes.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl BookingStore for MemoryStore {
    fn update_states(&mut self, ids: &BTreeSet<String>, state: BookingState) {
        if ids.is_empty() {
            return;
        }
        log::debug!("staging {} bookings as {state:?}", ids.len());
        for id in ids {
            self.pending.insert(id.clone(), state);
        }
    }

    fn commit(&mut self) {
        self.committed.append(&mut self.pending);
    }
}
