//! Capacitated deferred-acceptance matcher.
//!
//! Generalizes Gale–Shapley proposal/rejection to occasions with
//! capacity ranges and priority-weighted acceptance, with an extra
//! attendee-side exclusivity rule: an attendee's own pending bookings
//! mutually exclude each other by time overlap, independent of occasion
//! capacity. Because of that side-constraint, the result is not
//! guaranteed to be stable in the strict Gale–Shapley sense, nor
//! welfare-optimal.
//!
//! # Protocol
//!
//! Repeated passes until a full pass yields zero new matches or every
//! occasion is full:
//!
//! 1. All attendees with a non-empty wishlist propose, in randomized
//!    order, each walking its wishlist in descending priority until an
//!    occasion accepts.
//! 2. An occasion below usable capacity accepts unconditionally; a full
//!    occasion evicts its lowest-scored holder when the proposal scores
//!    strictly higher, otherwise rejects.
//! 3. Confirming a booking blocks the attendee's conflicting wishlist
//!    entries; an eviction returns the booking to its attendee's
//!    wishlist and restores blocked entries that no longer conflict with
//!    anything held or still blocked.
//!
//! The matcher starts from the snapshot's current states (open bookings
//! form the wishlists, accepted bookings already hold their seats), so
//! running it on its own output performs no further accepts and returns
//! the same partition. Resetting to all-open is the caller's decision.
//!
//! Termination: every accept either fills unused capacity or strictly
//! raises the accepting occasion's minimum held score, and a pass
//! without a single accept ends the loop.
//!
//! # References
//! - Gale & Shapley (1962), "College Admissions and the Stability of
//!   Marriage"
//! - Roth (1984), "The Evolution of the Labor Market for Medical Interns
//!   and Residents"

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::MatchOutcome;
use crate::models::{BookingState, Snapshot};

/// Deferred-acceptance matcher over a loaded snapshot.
#[derive(Debug, Clone, Default)]
pub struct DeferredAcceptance;

/// Per-attendee proposal state.
#[derive(Debug, Default)]
struct AttendeeQueue {
    /// Open bookings ordered by descending priority (id tie-break);
    /// the front is the next proposal.
    wishlist: Vec<String>,
    /// Wishlist entries provisionally withdrawn because they conflict
    /// with a currently-held booking.
    blocked: Vec<String>,
    /// Currently-held bookings (mutually non-conflicting).
    accepted: Vec<String>,
}

/// Per-occasion acceptance state.
#[derive(Debug, Default)]
struct OccasionSeats {
    held: Vec<String>,
}

impl DeferredAcceptance {
    /// Creates a matcher.
    pub fn new() -> Self {
        Self
    }

    /// Runs the full proposal/rejection protocol and returns the final
    /// partition.
    ///
    /// Wishlists are built from the snapshot's open bookings and seats
    /// from its accepted bookings, so a run over a fresh (all-open)
    /// snapshot matches from scratch while a run over a previous
    /// outcome is a no-op fixpoint.
    pub fn run<R: Rng>(&self, snapshot: &Snapshot, rng: &mut R) -> MatchOutcome {
        let mut attendees: BTreeMap<String, AttendeeQueue> = snapshot
            .attendees()
            .map(|a| {
                let mut queue = AttendeeQueue::default();
                for id in &a.booking_ids {
                    let Some(booking) = snapshot.booking(id) else {
                        continue;
                    };
                    match booking.state {
                        BookingState::Open => queue.wishlist.push(id.clone()),
                        BookingState::Accepted => queue.accepted.push(id.clone()),
                        BookingState::Blocked => queue.blocked.push(id.clone()),
                    }
                }
                sort_wishlist(&mut queue.wishlist, snapshot);
                (a.id.clone(), queue)
            })
            .collect();

        // One seat table per occasion actually referenced by a booking;
        // accepted bookings already hold their seats.
        let mut seats: BTreeMap<String, OccasionSeats> = BTreeMap::new();
        for booking in snapshot.bookings() {
            if snapshot.occasion(&booking.occasion_id).is_none() {
                continue;
            }
            let seat = seats.entry(booking.occasion_id.clone()).or_default();
            if booking.state == BookingState::Accepted {
                seat.held.push(booking.id.clone());
            }
        }

        let mut pass = 0u32;
        loop {
            let everything_full = !seats.is_empty()
                && seats.iter().all(|(occasion_id, s)| {
                    snapshot
                        .occasion(occasion_id)
                        .map(|o| s.held.len() >= o.spots.usable())
                        .unwrap_or(true)
                });
            if everything_full {
                break;
            }

            let mut proposers: Vec<String> = attendees
                .iter()
                .filter(|(_, q)| !q.wishlist.is_empty())
                .map(|(id, _)| id.clone())
                .collect();
            if proposers.is_empty() {
                break;
            }
            proposers.shuffle(rng);

            let mut matches = 0usize;
            while let Some(attendee_id) = proposers.pop() {
                let wishlist = attendees
                    .get(&attendee_id)
                    .map(|q| q.wishlist.clone())
                    .unwrap_or_default();

                for booking_id in wishlist {
                    if propose(snapshot, &mut attendees, &mut seats, &attendee_id, &booking_id) {
                        matches += 1;
                        break;
                    }
                }
            }

            pass += 1;
            log::debug!("pass {pass}: {matches} accepts");
            if matches == 0 {
                break;
            }
        }

        let mut outcome = MatchOutcome::default();
        for queue in attendees.values() {
            outcome.open.extend(queue.wishlist.iter().cloned());
            outcome.accepted.extend(queue.accepted.iter().cloned());
            outcome.blocked.extend(queue.blocked.iter().cloned());
        }
        outcome
    }
}

/// One proposal. Returns true on accept (including accept-by-eviction).
fn propose(
    snapshot: &Snapshot,
    attendees: &mut BTreeMap<String, AttendeeQueue>,
    seats: &mut BTreeMap<String, OccasionSeats>,
    attendee_id: &str,
    booking_id: &str,
) -> bool {
    let Some(booking) = snapshot.booking(booking_id) else {
        return false;
    };
    let Some(occasion) = snapshot.occasion(&booking.occasion_id) else {
        return false;
    };
    let usable = occasion.spots.usable();

    let Some(seat) = seats.get_mut(&booking.occasion_id) else {
        return false;
    };

    if seat.held.len() < usable {
        seat.held.push(booking_id.to_string());
        confirm(snapshot, attendees, attendee_id, booking_id);
        return true;
    }

    // Full: evict the lowest-scored holder iff the proposal scores
    // strictly higher. Score compares candidates for the same occasion
    // only, never across occasions.
    let Some(worst) = seat
        .held
        .iter()
        .min_by_key(|id| (score(snapshot, id), (*id).clone()))
        .cloned()
    else {
        return false;
    };

    if score(snapshot, booking_id) > score(snapshot, &worst) {
        seat.held.retain(|id| *id != worst);
        seat.held.push(booking_id.to_string());
        confirm(snapshot, attendees, attendee_id, booking_id);
        if let Some(owner) = snapshot.booking(&worst).map(|b| b.attendee_id.clone()) {
            unconfirm(snapshot, attendees, &owner, &worst);
        }
        return true;
    }

    false
}

/// Acceptance score of a booking: its priority.
fn score(snapshot: &Snapshot, booking_id: &str) -> i32 {
    snapshot.booking(booking_id).map(|b| b.priority).unwrap_or(0)
}

/// Moves a booking from the wishlist into the accepted set, withdrawing
/// every other wishlist entry that conflicts with it.
fn confirm(
    snapshot: &Snapshot,
    attendees: &mut BTreeMap<String, AttendeeQueue>,
    attendee_id: &str,
    booking_id: &str,
) {
    let Some(queue) = attendees.get_mut(attendee_id) else {
        return;
    };
    let Some(booking) = snapshot.booking(booking_id) else {
        return;
    };

    let conflicting: Vec<String> = queue
        .wishlist
        .iter()
        .filter(|id| id.as_str() != booking_id)
        .filter(|id| {
            snapshot
                .booking(id)
                .map(|other| snapshot.conflicts(other, booking))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    queue
        .wishlist
        .retain(|id| id != booking_id && !conflicting.contains(id));
    queue.blocked.extend(conflicting);
    queue.accepted.push(booking_id.to_string());
}

/// Returns an evicted booking to the wishlist and restores every blocked
/// entry that conflicts with neither a currently-held booking nor any
/// other still-blocked entry.
fn unconfirm(
    snapshot: &Snapshot,
    attendees: &mut BTreeMap<String, AttendeeQueue>,
    attendee_id: &str,
    booking_id: &str,
) {
    let Some(queue) = attendees.get_mut(attendee_id) else {
        return;
    };

    queue.accepted.retain(|id| id != booking_id);
    queue.wishlist.push(booking_id.to_string());

    let blocked = queue.blocked.clone();
    let restorable: Vec<String> = blocked
        .iter()
        .filter(|id| {
            let conflicts_held = queue
                .accepted
                .iter()
                .any(|held| conflicts_by_id(snapshot, id, held));
            let conflicts_blocked = blocked
                .iter()
                .filter(|other| other != id)
                .any(|other| conflicts_by_id(snapshot, id, other));
            !conflicts_held && !conflicts_blocked
        })
        .cloned()
        .collect();

    queue.blocked.retain(|id| !restorable.contains(id));
    queue.wishlist.extend(restorable);
    sort_wishlist(&mut queue.wishlist, snapshot);
}

fn conflicts_by_id(snapshot: &Snapshot, a: &str, b: &str) -> bool {
    match (snapshot.booking(a), snapshot.booking(b)) {
        (Some(a), Some(b)) => snapshot.conflicts(a, b),
        _ => false,
    }
}

/// Orders a wishlist by descending priority, booking id as tie-break.
fn sort_wishlist(wishlist: &mut [String], snapshot: &Snapshot) {
    wishlist.sort_by_key(|id| {
        let priority = snapshot.booking(id).map(|b| b.priority).unwrap_or(0);
        (std::cmp::Reverse(priority), id.clone())
    });
}
