//! Occasion (supply-side slot) model.
//!
//! An occasion is a capacity- and time-bounded slot that competing
//! bookings are matched against.
//!
//! # Time Model
//! All times are in milliseconds relative to a matching epoch.
//! The consumer defines what the epoch means.
//!
//! # Capacity Model
//! Capacity is a half-open range `[lower, upper)`. `lower` is the minimum
//! viable group size; the usable capacity is `upper - 1` — by construction
//! the last spot is reserved and never filled, a policy inherited from the
//! domain and preserved as-is.

use serde::{Deserialize, Serialize};

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }

    /// Whether two windows overlap.
    ///
    /// A shared endpoint does not count as overlap (half-open semantics).
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }
}

/// Capacity range of an occasion: `[lower, upper)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Spots {
    /// Minimum viable number of accepted bookings (floor).
    pub lower: usize,
    /// Exclusive upper bound; `upper - 1` bookings are actually usable.
    pub upper: usize,
}

impl Spots {
    /// Creates a capacity range.
    pub fn new(lower: usize, upper: usize) -> Self {
        Self { lower, upper }
    }

    /// Number of spots that may actually be filled.
    #[inline]
    pub fn usable(&self) -> usize {
        self.upper.saturating_sub(1)
    }
}

/// A capacity- and time-bounded slot on the supply side of the matching.
///
/// Occasions never change during a run; only the states of the bookings
/// referencing them do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occasion {
    /// Unique occasion identifier.
    pub id: String,
    /// Execution time window.
    pub window: TimeWindow,
    /// Capacity range `[lower, upper)`.
    pub spots: Spots,
}

impl Occasion {
    /// Creates a new occasion.
    pub fn new(id: impl Into<String>, window: TimeWindow, spots: Spots) -> Self {
        Self {
            id: id.into(),
            window,
            spots,
        }
    }
}
