//! Pick strategies for the greedy allocator.
//!
//! A strategy selects one booking at a time from an occasion's candidate
//! queue. Strategies are a closed enumeration dispatched by configuration
//! rather than a trait object, which keeps the four policies testable in
//! isolation and the configuration surface a plain name.
//!
//! # Candidate Queue Convention
//! Candidate queues are ordered by ascending priority (booking id as the
//! final tie-break), so popping from the back yields the strongest
//! preference first.

use std::collections::BTreeSet;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::models::Snapshot;

/// Booking selection policy used by the greedy allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickStrategy {
    /// Pops candidates in their existing order (strongest preference
    /// first). Deterministic; useful as a control baseline in testing,
    /// not a real policy.
    FavoriteFirst,
    /// Picks uniformly among all candidates.
    Random,
    /// Picks uniformly among priority candidates when any exist,
    /// otherwise uniformly among the rest.
    PriorityFirst,
    /// Among priority candidates (or all, when none carry priority),
    /// picks the one blocking the fewest other open bookings of the same
    /// attendee. Ties go to the first minimal element.
    LeastImpact,
}

impl Default for PickStrategy {
    fn default() -> Self {
        Self::PriorityFirst
    }
}

impl PickStrategy {
    /// Configuration name of this strategy.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FavoriteFirst => "favorite-first",
            Self::Random => "random",
            Self::PriorityFirst => "priority-first",
            Self::LeastImpact => "least-impact",
        }
    }

    /// Removes and returns one booking id from `candidates`.
    ///
    /// `open` is the id set of all bookings still open in this pass; the
    /// least-impact policy scans it to count how many alternatives a pick
    /// would block. Returns `None` when the queue is empty.
    pub fn pick<R: Rng>(
        &self,
        candidates: &mut Vec<String>,
        open: &BTreeSet<String>,
        snapshot: &Snapshot,
        rng: &mut R,
    ) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let index = match self {
            Self::FavoriteFirst => candidates.len() - 1,
            Self::Random => rng.random_range(0..candidates.len()),
            Self::PriorityFirst => {
                let favored = favored_indices(candidates, snapshot);
                if favored.is_empty() {
                    rng.random_range(0..candidates.len())
                } else {
                    favored[rng.random_range(0..favored.len())]
                }
            }
            Self::LeastImpact => {
                let favored = favored_indices(candidates, snapshot);
                let pool = if favored.is_empty() {
                    (0..candidates.len()).collect()
                } else {
                    favored
                };

                let mut best = pool[0];
                let mut best_impact = impact(&candidates[best], open, snapshot);
                for &i in &pool[1..] {
                    let candidate_impact = impact(&candidates[i], open, snapshot);
                    if candidate_impact < best_impact {
                        best = i;
                        best_impact = candidate_impact;
                    }
                }
                best
            }
        };

        Some(candidates.remove(index))
    }
}

/// Indices of candidates carrying a priority.
fn favored_indices(candidates: &[String], snapshot: &Snapshot) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, id)| snapshot.booking(id).map(|b| b.priority > 0).unwrap_or(false))
        .map(|(i, _)| i)
        .collect()
}

/// Number of other open bookings of the same attendee that accepting
/// `candidate_id` would block.
fn impact(candidate_id: &str, open: &BTreeSet<String>, snapshot: &Snapshot) -> usize {
    let Some(candidate) = snapshot.booking(candidate_id) else {
        return 0;
    };

    open.iter()
        .filter(|id| id.as_str() != candidate_id)
        .filter_map(|id| snapshot.booking(id))
        .filter(|b| b.attendee_id == candidate.attendee_id && snapshot.conflicts(b, candidate))
        .count()
}

impl FromStr for PickStrategy {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorite-first" => Ok(Self::FavoriteFirst),
            "random" => Ok(Self::Random),
            "priority-first" => Ok(Self::PriorityFirst),
            "least-impact" => Ok(Self::LeastImpact),
            other => Err(MatchError::UnknownStrategy(other.to_string())),
        }
    }
}
