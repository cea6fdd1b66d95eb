//! In-memory snapshot of one matching run.
//!
//! All bookings, occasions, and attendees are materialized up front —
//! nothing is lazily loaded during matching. Entities are held in
//! identity-keyed maps so set membership is an O(log n) id lookup and
//! iteration order is deterministic, which the greedy allocator's
//! reproducibility guarantee depends on.
//!
//! The matching algorithms never create or delete entities; they only
//! rewrite booking states.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Attendee, Booking, BookingState, Occasion, TimeWindow};

/// Fully-loaded input for one matching run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    bookings: BTreeMap<String, Booking>,
    occasions: BTreeMap<String, Occasion>,
    attendees: BTreeMap<String, Attendee>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an occasion.
    pub fn with_occasion(mut self, occasion: Occasion) -> Self {
        self.occasions.insert(occasion.id.clone(), occasion);
        self
    }

    /// Adds an attendee.
    pub fn with_attendee(mut self, attendee: Attendee) -> Self {
        self.attendees.insert(attendee.id.clone(), attendee);
        self
    }

    /// Adds a booking, registering it with its attendee.
    ///
    /// The attendee entry is created on first reference so callers do not
    /// have to add attendees separately.
    pub fn with_booking(mut self, booking: Booking) -> Self {
        self.attendees
            .entry(booking.attendee_id.clone())
            .or_insert_with(|| Attendee::new(booking.attendee_id.clone()))
            .booking_ids
            .push(booking.id.clone());
        self.bookings.insert(booking.id.clone(), booking);
        self
    }

    /// Looks up a booking by id.
    pub fn booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.get(id)
    }

    /// Looks up an occasion by id.
    pub fn occasion(&self, id: &str) -> Option<&Occasion> {
        self.occasions.get(id)
    }

    /// Looks up an attendee by id.
    pub fn attendee(&self, id: &str) -> Option<&Attendee> {
        self.attendees.get(id)
    }

    /// All bookings, in id order.
    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    /// All occasions, in id order.
    pub fn occasions(&self) -> impl Iterator<Item = &Occasion> {
        self.occasions.values()
    }

    /// All attendees, in id order.
    pub fn attendees(&self) -> impl Iterator<Item = &Attendee> {
        self.attendees.values()
    }

    /// Number of bookings.
    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    /// Ids of all bookings currently in the given state, in id order.
    pub fn booking_ids_in_state(&self, state: BookingState) -> BTreeSet<String> {
        self.bookings
            .values()
            .filter(|b| b.state == state)
            .map(|b| b.id.clone())
            .collect()
    }

    /// Number of accepted bookings for an occasion.
    pub fn accepted_count(&self, occasion_id: &str) -> usize {
        self.bookings
            .values()
            .filter(|b| b.occasion_id == occasion_id && b.state == BookingState::Accepted)
            .count()
    }

    /// Time window of a booking's occasion, if the occasion is resolved.
    pub fn window_of(&self, booking: &Booking) -> Option<TimeWindow> {
        self.occasions.get(&booking.occasion_id).map(|o| o.window)
    }

    /// Whether two bookings conflict.
    ///
    /// True iff both belong to the same attendee and their occasions'
    /// time windows overlap (half-open interval semantics). Bookings with
    /// an unresolved occasion never conflict.
    pub fn conflicts(&self, a: &Booking, b: &Booking) -> bool {
        if a.attendee_id != b.attendee_id {
            return false;
        }
        match (self.window_of(a), self.window_of(b)) {
            (Some(wa), Some(wb)) => wa.overlaps(&wb),
            _ => false,
        }
    }

    /// Resets every booking to [`BookingState::Open`].
    ///
    /// Performed at the start of round 0 of either matcher; later rounds
    /// preserve prior state so matching is incrementally re-runnable.
    pub fn reset_to_open(&mut self) {
        for booking in self.bookings.values_mut() {
            booking.state = BookingState::Open;
        }
    }

    /// Rewrites the state of the given bookings. Unknown ids are ignored.
    pub fn set_states(&mut self, ids: &BTreeSet<String>, state: BookingState) {
        for id in ids {
            if let Some(booking) = self.bookings.get_mut(id) {
                booking.state = state;
            }
        }
    }
}
