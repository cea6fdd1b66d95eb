//! Matching quality metrics (KPIs).
//!
//! Computes indicators of how good a committed partition is for the
//! attendees and the organizers. Used to compare strategies and margins
//! across runs, never to drive the matching itself.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Happiness | Per attendee: priority-weighted share of accepted bookings |
//! | Mean Happiness | Mean over attendees with at least one booking |
//! | Happiness Stdev | Sample standard deviation of the same scores |
//! | Operable Rate | Fraction of occasions filled to at least their floor |
//! | Overlap Rate | Fraction of occasions overlapping their successor in start order |

use serde::{Deserialize, Serialize};

use crate::models::{Attendee, BookingState, Snapshot, TimeWindow};

/// Matching quality indicators for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchKpi {
    /// Mean attendee happiness (0.0..1.0). `None` when no attendee has
    /// a booking.
    pub happiness_mean: Option<f64>,
    /// Sample standard deviation of happiness. `None` with fewer than
    /// two scored attendees.
    pub happiness_stdev: Option<f64>,
    /// Fraction of occasions holding at least their floor (0.0..1.0).
    pub operable_rate: f64,
    /// Fraction of occasions whose window overlaps the next one in
    /// start order (0.0..1.0). A density measure of the program layout.
    pub overlap_rate: f64,
    /// Accepted bookings in the snapshot.
    pub accepted_count: usize,
    /// Open bookings in the snapshot.
    pub open_count: usize,
    /// Blocked bookings in the snapshot.
    pub blocked_count: usize,
}

impl MatchKpi {
    /// Computes all indicators from a snapshot.
    pub fn calculate(snapshot: &Snapshot) -> Self {
        let scores: Vec<f64> = snapshot
            .attendees()
            .filter_map(|a| happiness(snapshot, a))
            .collect();

        let happiness_mean = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        let happiness_stdev = happiness_mean.filter(|_| scores.len() >= 2).map(|mean| {
            let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
                / (scores.len() - 1) as f64;
            variance.sqrt()
        });

        let mut accepted_count = 0;
        let mut open_count = 0;
        let mut blocked_count = 0;
        for booking in snapshot.bookings() {
            match booking.state {
                BookingState::Open => open_count += 1,
                BookingState::Accepted => accepted_count += 1,
                BookingState::Blocked => blocked_count += 1,
            }
        }

        Self {
            happiness_mean,
            happiness_stdev,
            operable_rate: operable_rate(snapshot),
            overlap_rate: overlap_rate(snapshot),
            accepted_count,
            open_count,
            blocked_count,
        }
    }
}

/// Priority-weighted share of an attendee's bookings that got accepted.
///
/// A booking with priority p contributes weight p + 1, so losing a
/// prioritized wish hurts the score more than losing a plain one.
/// `None` when the attendee has no bookings.
pub fn happiness(snapshot: &Snapshot, attendee: &Attendee) -> Option<f64> {
    let mut achieved = 0u64;
    let mut possible = 0u64;

    for booking in attendee
        .booking_ids
        .iter()
        .filter_map(|id| snapshot.booking(id))
    {
        let weight = (booking.priority.max(0) as u64) + 1;
        possible += weight;
        if booking.state == BookingState::Accepted {
            achieved += weight;
        }
    }

    if possible == 0 {
        None
    } else {
        Some(achieved as f64 / possible as f64)
    }
}

/// Fraction of occasions filled to at least their floor.
fn operable_rate(snapshot: &Snapshot) -> f64 {
    let total = snapshot.occasions().count();
    if total == 0 {
        return 0.0;
    }

    let operable = snapshot
        .occasions()
        .filter(|o| snapshot.accepted_count(&o.id) >= o.spots.lower)
        .count();
    operable as f64 / total as f64
}

/// Fraction of occasions overlapping their successor in start order.
fn overlap_rate(snapshot: &Snapshot) -> f64 {
    let total = snapshot.occasions().count();
    if total == 0 {
        return 0.0;
    }

    let mut windows: Vec<(String, TimeWindow)> = snapshot
        .occasions()
        .map(|o| (o.id.clone(), o.window))
        .collect();
    windows.sort_by_key(|(id, w)| (w.start_ms, id.clone()));

    let overlapping = windows
        .windows(2)
        .filter(|pair| pair[0].1.overlaps(&pair[1].1))
        .count();
    overlapping as f64 / total as f64
}
