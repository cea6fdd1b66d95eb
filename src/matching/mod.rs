//! Matching engine: strategies, the two matchers, and the run
//! orchestrator.
//!
//! A run takes a loaded [`Snapshot`](crate::models::Snapshot), executes
//! the configured matcher, validates the resulting partition against the
//! run invariants, and persists the state changes through a
//! [`BookingStore`](crate::store::BookingStore) in one commit.
//!
//! # Example
//!
//! ```
//! use bookmatch::config::{Algorithm, MatchConfig};
//! use bookmatch::matching;
//! use bookmatch::models::{Booking, Occasion, Snapshot, Spots, TimeWindow};
//! use bookmatch::store::MemoryStore;
//!
//! let mut snapshot = Snapshot::new()
//!     .with_occasion(Occasion::new(
//!         "O1",
//!         TimeWindow::new(0, 3_600_000),
//!         Spots::new(1, 4),
//!     ))
//!     .with_booking(Booking::new("B1", "A1", "O1"));
//!
//! let config = MatchConfig::new(Algorithm::Greedy);
//! let mut store = MemoryStore::new();
//!
//! let outcome = matching::run(&mut snapshot, &config, &mut store)?;
//! assert!(outcome.accepted.contains("B1"));
//! # Ok::<(), bookmatch::MatchError>(())
//! ```

mod deferred;
mod greedy;
mod strategy;

pub use deferred::DeferredAcceptance;
pub use greedy::GreedyAllocator;
pub use strategy::PickStrategy;

use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{Algorithm, MatchConfig};
use crate::error::{MatchError, Result};
use crate::models::{BookingState, Snapshot};
use crate::store::BookingStore;
use crate::validation::{self, CapacityPolicy};

/// Final partition of a run: every booking id lands in exactly one set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Bookings still undecided.
    pub open: BTreeSet<String>,
    /// Bookings holding a spot.
    pub accepted: BTreeSet<String>,
    /// Bookings withdrawn because an overlapping booking of the same
    /// attendee was accepted.
    pub blocked: BTreeSet<String>,
}

impl MatchOutcome {
    /// Total number of bookings across the three sets.
    pub fn total(&self) -> usize {
        self.open.len() + self.accepted.len() + self.blocked.len()
    }

    /// The state this outcome assigns to a booking, if any.
    pub fn state_of(&self, booking_id: &str) -> Option<BookingState> {
        if self.accepted.contains(booking_id) {
            Some(BookingState::Accepted)
        } else if self.blocked.contains(booking_id) {
            Some(BookingState::Blocked)
        } else if self.open.contains(booking_id) {
            Some(BookingState::Open)
        } else {
            None
        }
    }
}

/// Executes one matching run end to end.
///
/// Validates the configuration, seeds the RNG from the round number,
/// dispatches to the configured matcher, writes the partition back into
/// the snapshot, checks the run invariants, and commits the state
/// changes through `store` as a single boundary.
///
/// An invariant violation aborts the run before anything reaches the
/// store; the snapshot still reflects the violating partition so the
/// caller can inspect it.
pub fn run(
    snapshot: &mut Snapshot,
    config: &MatchConfig,
    store: &mut dyn BookingStore,
) -> Result<MatchOutcome> {
    config.validate()?;
    let mut rng = SmallRng::seed_from_u64(config.round);

    let (outcome, policy) = match config.algorithm {
        Algorithm::Greedy => {
            let allocator = GreedyAllocator::new(config.strategy)
                .with_safety_margin(config.safety_margin as usize);
            let outcome = allocator.allocate(snapshot, config.round, &mut rng);
            // The greedy path guarantees its floor after every round.
            (outcome, CapacityPolicy::FloorChecked)
        }
        Algorithm::DeferredAcceptance => {
            // The matcher itself resumes from current states; a fresh
            // run starts from all-open.
            if config.round == 0 {
                snapshot.reset_to_open();
            }
            let outcome = DeferredAcceptance::new().run(snapshot, &mut rng);
            // Deferred acceptance fills toward the ceiling and may leave
            // an occasion below its floor.
            (outcome, CapacityPolicy::CeilingOnly)
        }
    };

    snapshot.set_states(&outcome.open, BookingState::Open);
    snapshot.set_states(&outcome.accepted, BookingState::Accepted);
    snapshot.set_states(&outcome.blocked, BookingState::Blocked);

    validation::validate_outcome(snapshot, &outcome, policy)
        .map_err(MatchError::InvariantViolation)?;

    store.update_states(&outcome.open, BookingState::Open);
    store.update_states(&outcome.accepted, BookingState::Accepted);
    store.update_states(&outcome.blocked, BookingState::Blocked);
    store.commit();

    log::info!(
        "run complete ({:?}, round {}): {} accepted, {} blocked, {} open",
        config.algorithm,
        config.round,
        outcome.accepted.len(),
        outcome.blocked.len(),
        outcome.open.len()
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, Occasion, Spots, TimeWindow};
    use crate::store::MemoryStore;

    fn occasion(id: &str, start: i64, end: i64, lower: usize, upper: usize) -> Occasion {
        Occasion::new(id, TimeWindow::new(start, end), Spots::new(lower, upper))
    }

    #[test]
    fn test_outcome_state_of() {
        let mut outcome = MatchOutcome::default();
        outcome.accepted.insert("B1".to_string());
        outcome.blocked.insert("B2".to_string());
        outcome.open.insert("B3".to_string());

        assert_eq!(outcome.state_of("B1"), Some(BookingState::Accepted));
        assert_eq!(outcome.state_of("B2"), Some(BookingState::Blocked));
        assert_eq!(outcome.state_of("B3"), Some(BookingState::Open));
        assert_eq!(outcome.state_of("B4"), None);
        assert_eq!(outcome.total(), 3);
    }

    #[test]
    fn test_run_greedy_commits_to_store() {
        let mut snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1"));
        let config = MatchConfig::new(Algorithm::Greedy);
        let mut store = MemoryStore::new();

        let outcome = run(&mut snapshot, &config, &mut store).unwrap();
        assert!(outcome.accepted.contains("B1"));
        assert_eq!(store.state_of("B1"), Some(BookingState::Accepted));
        assert_eq!(
            snapshot.booking("B1").unwrap().state,
            BookingState::Accepted
        );
    }

    #[test]
    fn test_run_deferred_acceptance() {
        let mut snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_occasion(occasion("O2", 50, 150, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1").with_priority(1))
            .with_booking(Booking::new("B2", "A1", "O2"));
        let config = MatchConfig::new(Algorithm::DeferredAcceptance);
        let mut store = MemoryStore::new();

        let outcome = run(&mut snapshot, &config, &mut store).unwrap();
        assert!(outcome.accepted.contains("B1"));
        assert!(outcome.blocked.contains("B2"));
        assert_eq!(store.state_of("B2"), Some(BookingState::Blocked));
    }

    #[test]
    fn test_run_rejects_bad_config() {
        let mut snapshot = Snapshot::new();
        let config = MatchConfig::new(Algorithm::Greedy).with_safety_margin(-1);
        let mut store = MemoryStore::new();

        assert!(matches!(
            run(&mut snapshot, &config, &mut store),
            Err(MatchError::NegativeSafetyMargin(-1))
        ));
    }

    /// Same snapshot, same round: the two runs commit identical
    /// partitions.
    #[test]
    fn test_run_reproducible() {
        let build = || {
            let mut s = Snapshot::new()
                .with_occasion(occasion("O1", 0, 100, 2, 6))
                .with_occasion(occasion("O2", 200, 300, 2, 6));
            for i in 0..8 {
                s = s.with_booking(Booking::new(
                    format!("B{i}"),
                    format!("A{i}"),
                    format!("O{}", i % 2 + 1),
                ));
            }
            s
        };
        let config = MatchConfig::new(Algorithm::Greedy)
            .with_strategy(PickStrategy::Random)
            .with_round(5);

        let mut first = build();
        let mut second = build();
        let a = run(&mut first, &config, &mut MemoryStore::new()).unwrap();
        let b = run(&mut second, &config, &mut MemoryStore::new()).unwrap();
        assert_eq!(a, b);
    }
}
