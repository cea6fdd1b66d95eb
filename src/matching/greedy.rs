//! Round-based randomized greedy allocator.
//!
//! # Algorithm
//!
//! 1. Round 0 resets every booking to open; later rounds preserve prior
//!    accepted/blocked state, making the allocator incrementally
//!    re-runnable.
//! 2. Open bookings are grouped by occasion into priority-ordered
//!    candidate queues; the occasion processing order is shuffled so no
//!    occasion is systematically favored across repeated runs.
//! 3. Each occasion that can reach its capacity floor in one pass picks
//!    `floor + safety_margin` bookings via the configured strategy, never
//!    exceeding the usable capacity together with bookings accepted in
//!    earlier rounds. Every pick blocks the attendee's other open
//!    bookings whose occasions overlap it (the collateral set).
//! 4. Picks become accepted, collateral becomes blocked; everything else
//!    stays open for a later round.
//!
//! An occasion whose candidate pool drains below the floor mid-pick
//! (collateral can remove candidates) is rolled back for the round rather
//! than committed under-filled, keeping the floor guarantee checkable
//! after every round.
//!
//! # Complexity
//! O(n * m) per round in the worst case, where n = open bookings and
//! m = picks; every pick scans the open set once for collateral.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;

use super::{MatchOutcome, PickStrategy};
use crate::models::{BookingState, Snapshot};

/// Greedy allocator filling occasions up to their floor plus a margin.
#[derive(Debug, Clone)]
pub struct GreedyAllocator {
    strategy: PickStrategy,
    safety_margin: usize,
}

impl GreedyAllocator {
    /// Creates an allocator with the given pick strategy and no margin.
    pub fn new(strategy: PickStrategy) -> Self {
        Self {
            strategy,
            safety_margin: 0,
        }
    }

    /// Sets the number of extra picks beyond each occasion's floor.
    pub fn with_safety_margin(mut self, margin: usize) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Runs one allocation round and returns the final partition.
    ///
    /// Round 0 resets the snapshot to all-open first. The RNG must be
    /// seeded deterministically by the caller (same seed and snapshot
    /// state reproduce the identical partition).
    pub fn allocate<R: Rng>(
        &self,
        snapshot: &mut Snapshot,
        round: u64,
        rng: &mut R,
    ) -> MatchOutcome {
        if round == 0 {
            snapshot.reset_to_open();
        }

        let mut open = snapshot.booking_ids_in_state(BookingState::Open);
        let mut accepted = snapshot.booking_ids_in_state(BookingState::Accepted);
        let mut blocked = snapshot.booking_ids_in_state(BookingState::Blocked);

        let mut by_occasion = candidate_queues(snapshot, &open);
        by_occasion.shuffle(rng);

        for (occasion_id, mut candidates) in by_occasion {
            let Some(occasion) = snapshot.occasion(&occasion_id) else {
                // Unresolved occasion reference: the bookings stay open.
                continue;
            };
            let spots = occasion.spots;

            // Re-sync against decisions taken for occasions processed
            // earlier in this pass.
            candidates.retain(|id| !blocked.contains(id) && !accepted.contains(id));

            // Cannot reach the floor this round; retried later once more
            // candidates materialize.
            if candidates.len() < spots.lower {
                continue;
            }

            let existing = accepted
                .iter()
                .filter_map(|id| snapshot.booking(id))
                .filter(|b| b.occasion_id == occasion_id)
                .count();
            if existing >= spots.usable() {
                continue;
            }

            let required = spots.lower + self.safety_margin;
            let mut picks: BTreeSet<String> = BTreeSet::new();
            let mut collateral: BTreeSet<String> = BTreeSet::new();

            while !candidates.is_empty() && picks.len() < required {
                // The margin never pushes past the usable capacity left
                // over from earlier rounds.
                if picks.len() + existing == spots.usable() {
                    break;
                }

                let Some(pick_id) = self.strategy.pick(&mut candidates, &open, snapshot, rng)
                else {
                    break;
                };

                // Everything this attendee has open that overlaps the
                // pick becomes impossible once this occasion locks it in.
                if let Some(pick) = snapshot.booking(&pick_id) {
                    for id in &open {
                        if picks.contains(id) || collateral.contains(id) || *id == pick_id {
                            continue;
                        }
                        if let Some(other) = snapshot.booking(id) {
                            if other.attendee_id == pick.attendee_id
                                && snapshot.conflicts(other, pick)
                            {
                                collateral.insert(id.clone());
                            }
                        }
                    }
                }
                picks.insert(pick_id);

                candidates.retain(|id| !collateral.contains(id));
            }

            // Collateral drained the pool below the floor: roll back so
            // the occasion is not committed under-filled.
            if picks.len() + existing < spots.lower {
                log::debug!(
                    "occasion {occasion_id}: pool drained to {} picks, floor {} — rolled back",
                    picks.len(),
                    spots.lower
                );
                continue;
            }

            log::debug!(
                "occasion {occasion_id}: accepting {} picks, blocking {} collateral",
                picks.len(),
                collateral.len()
            );

            for id in &picks {
                open.remove(id);
            }
            for id in &collateral {
                open.remove(id);
            }
            accepted.append(&mut picks);
            blocked.append(&mut collateral);
        }

        MatchOutcome {
            open,
            accepted,
            blocked,
        }
    }
}

/// Groups open bookings into per-occasion candidate queues ordered by
/// ascending priority (id tie-break), so the back of each queue is the
/// strongest preference.
fn candidate_queues(snapshot: &Snapshot, open: &BTreeSet<String>) -> Vec<(String, Vec<String>)> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in open {
        if let Some(booking) = snapshot.booking(id) {
            groups
                .entry(booking.occasion_id.clone())
                .or_default()
                .push(id.clone());
        }
    }

    groups
        .into_iter()
        .map(|(occasion_id, mut candidates)| {
            candidates.sort_by_key(|id| {
                let priority = snapshot.booking(id).map(|b| b.priority).unwrap_or(0);
                (priority, id.clone())
            });
            (occasion_id, candidates)
        })
        .collect()
}
