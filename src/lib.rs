//! Capacity-bounded matching of bookings to occasions.
//!
//! Takes a snapshot of occasions with capacity ranges and attendee
//! bookings, and partitions the bookings into accepted, blocked, and
//! open sets such that no attendee holds two overlapping occasions and
//! no occasion runs outside its capacity bounds.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Occasion`, `Booking`, `Attendee`,
//!   `Snapshot`, `TimeWindow`, `Spots`
//! - **`matching`**: The two matchers (`GreedyAllocator`,
//!   `DeferredAcceptance`), pick strategies, and the run orchestrator
//! - **`validation`**: Post-run invariant checks (partition integrity,
//!   attendee overlaps, capacity bounds)
//! - **`kpi`**: Matching quality indicators (happiness, operable rate)
//! - **`store`**: Persistence boundary for committed state changes
//! - **`config`**: Run configuration and algorithm selection
//!
//! # Architecture
//!
//! Matchers operate purely on the in-memory [`models::Snapshot`]; I/O
//! happens only at the edges (loading the snapshot, committing state
//! changes through a [`store::BookingStore`]). Every run is
//! deterministic for a given snapshot and round number.
//!
//! # References
//!
//! - Gale & Shapley (1962), "College Admissions and the Stability of
//!   Marriage"
//! - Roth & Sotomayor (1990), "Two-Sided Matching"

pub mod config;
pub mod error;
pub mod kpi;
pub mod matching;
pub mod models;
pub mod store;
pub mod validation;

pub use error::{MatchError, Result};
