//! Post-run invariant checks.
//!
//! Every run ends with a validation pass over the snapshot and the
//! partition the matcher produced. A violation here is a hard stop: it
//! means the algorithm (or the loaded data) is defective, so the caller
//! aborts instead of committing a partially wrong assignment.
//!
//! Checked invariants:
//! - the partition is disjoint, covers every loaded booking exactly
//!   once, and the snapshot states agree with it
//! - no attendee holds two accepted bookings with overlapping occasion
//!   windows
//! - no occasion's accepted count reaches its spots ceiling (the last
//!   spot stays reserved)
//! - under [`CapacityPolicy::FloorChecked`], every touched occasion is
//!   filled to at least its floor

use std::collections::BTreeMap;

use crate::matching::MatchOutcome;
use crate::models::{BookingState, Snapshot, TimeWindow};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An attendee holds two accepted bookings whose occasion windows
    /// overlap.
    AttendeeOverlap,
    /// A touched occasion holds fewer accepted bookings than its floor.
    BelowCapacityFloor,
    /// An occasion's accepted count reached its spots ceiling.
    CapacityExceeded,
    /// The partition is not disjoint, misses a booking, or names an
    /// unknown one.
    PartitionViolation,
    /// A snapshot booking state disagrees with the partition.
    StateMismatch,
}

/// How strictly occasion capacity is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Ceiling and floor. The greedy allocator guarantees its floor
    /// after every round.
    FloorChecked,
    /// Ceiling only. Deferred acceptance fills toward the ceiling and
    /// legitimately leaves occasions below their floor.
    CeilingOnly,
}

/// Validates a run's partition against the snapshot.
///
/// Collects every violation instead of stopping at the first, so a
/// defect report names all affected bookings and occasions at once.
pub fn validate_outcome(
    snapshot: &Snapshot,
    outcome: &MatchOutcome,
    policy: CapacityPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();

    check_partition(snapshot, outcome, &mut errors);
    check_attendee_overlaps(snapshot, &mut errors);
    check_capacity(snapshot, policy, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_partition(snapshot: &Snapshot, outcome: &MatchOutcome, errors: &mut Vec<ValidationError>) {
    for id in outcome.open.intersection(&outcome.accepted) {
        errors.push(ValidationError::new(
            ValidationErrorKind::PartitionViolation,
            format!("Booking '{id}' is both open and accepted"),
        ));
    }
    for id in outcome.open.intersection(&outcome.blocked) {
        errors.push(ValidationError::new(
            ValidationErrorKind::PartitionViolation,
            format!("Booking '{id}' is both open and blocked"),
        ));
    }
    for id in outcome.accepted.intersection(&outcome.blocked) {
        errors.push(ValidationError::new(
            ValidationErrorKind::PartitionViolation,
            format!("Booking '{id}' is both accepted and blocked"),
        ));
    }

    for set in [&outcome.open, &outcome.accepted, &outcome.blocked] {
        for id in set {
            if snapshot.booking(id).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::PartitionViolation,
                    format!("Partition names unknown booking '{id}'"),
                ));
            }
        }
    }

    for booking in snapshot.bookings() {
        match outcome.state_of(&booking.id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::PartitionViolation,
                format!("Booking '{}' is missing from the partition", booking.id),
            )),
            Some(state) if state != booking.state => errors.push(ValidationError::new(
                ValidationErrorKind::StateMismatch,
                format!(
                    "Booking '{}' is {:?} in the snapshot but {:?} in the partition",
                    booking.id, booking.state, state
                ),
            )),
            Some(_) => {}
        }
    }
}

fn check_attendee_overlaps(snapshot: &Snapshot, errors: &mut Vec<ValidationError>) {
    for attendee in snapshot.attendees() {
        // Accepted bookings with a resolvable window, ordered by start;
        // with half-open windows an overlap must show up between
        // neighbors in that order.
        let mut windows: Vec<(String, TimeWindow)> = attendee
            .booking_ids
            .iter()
            .filter_map(|id| snapshot.booking(id))
            .filter(|b| b.state == BookingState::Accepted)
            .filter_map(|b| snapshot.window_of(b).map(|w| (b.id.clone(), w)))
            .collect();
        windows.sort_by_key(|(id, w)| (w.start_ms, id.clone()));

        for pair in windows.windows(2) {
            let (first_id, first) = &pair[0];
            let (second_id, second) = &pair[1];
            if first.overlaps(second) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::AttendeeOverlap,
                    format!(
                        "Attendee '{}' holds overlapping accepted bookings '{first_id}' and '{second_id}'",
                        attendee.id
                    ),
                ));
            }
        }
    }
}

fn check_capacity(snapshot: &Snapshot, policy: CapacityPolicy, errors: &mut Vec<ValidationError>) {
    let mut accepted: BTreeMap<&str, usize> = BTreeMap::new();
    let mut referenced: BTreeMap<&str, usize> = BTreeMap::new();
    for booking in snapshot.bookings() {
        *referenced.entry(booking.occasion_id.as_str()).or_default() += 1;
        if booking.state == BookingState::Accepted {
            *accepted.entry(booking.occasion_id.as_str()).or_default() += 1;
        }
    }

    for occasion in snapshot.occasions() {
        let held = accepted.get(occasion.id.as_str()).copied().unwrap_or(0);

        if held >= occasion.spots.upper {
            errors.push(ValidationError::new(
                ValidationErrorKind::CapacityExceeded,
                format!(
                    "Occasion '{}' holds {held} accepted bookings, ceiling is {}",
                    occasion.id, occasion.spots.upper
                ),
            ));
        }

        if policy == CapacityPolicy::FloorChecked
            && referenced.contains_key(occasion.id.as_str())
            && held > 0
            && held < occasion.spots.lower
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::BelowCapacityFloor,
                format!(
                    "Occasion '{}' holds {held} accepted bookings, floor is {}",
                    occasion.id, occasion.spots.lower
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, Occasion, Spots};

    fn occasion(id: &str, start: i64, end: i64, lower: usize, upper: usize) -> Occasion {
        Occasion::new(id, TimeWindow::new(start, end), Spots::new(lower, upper))
    }

    fn outcome_from(snapshot: &Snapshot) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        for booking in snapshot.bookings() {
            let set = match booking.state {
                BookingState::Open => &mut outcome.open,
                BookingState::Accepted => &mut outcome.accepted,
                BookingState::Blocked => &mut outcome.blocked,
            };
            set.insert(booking.id.clone());
        }
        outcome
    }

    fn kinds(result: ValidationResult) -> Vec<ValidationErrorKind> {
        result.unwrap_err().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_outcome_passes() {
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1").with_state(BookingState::Accepted))
            .with_booking(Booking::new("B2", "A2", "O1"));
        let outcome = outcome_from(&snapshot);

        assert!(validate_outcome(&snapshot, &outcome, CapacityPolicy::FloorChecked).is_ok());
    }

    #[test]
    fn test_attendee_overlap_detected() {
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_occasion(occasion("O2", 50, 150, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1").with_state(BookingState::Accepted))
            .with_booking(Booking::new("B2", "A1", "O2").with_state(BookingState::Accepted));
        let outcome = outcome_from(&snapshot);

        let kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::CeilingOnly,
        ));
        assert!(kinds.contains(&ValidationErrorKind::AttendeeOverlap));
    }

    #[test]
    fn test_adjacent_windows_not_overlapping() {
        // [0,100) and [100,200) share only the boundary instant.
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_occasion(occasion("O2", 100, 200, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1").with_state(BookingState::Accepted))
            .with_booking(Booking::new("B2", "A1", "O2").with_state(BookingState::Accepted));
        let outcome = outcome_from(&snapshot);

        assert!(validate_outcome(&snapshot, &outcome, CapacityPolicy::CeilingOnly).is_ok());
    }

    #[test]
    fn test_ceiling_violation() {
        let mut snapshot = Snapshot::new().with_occasion(occasion("O1", 0, 100, 1, 3));
        for i in 0..3 {
            snapshot = snapshot.with_booking(
                Booking::new(format!("B{i}"), format!("A{i}"), "O1")
                    .with_state(BookingState::Accepted),
            );
        }
        let outcome = outcome_from(&snapshot);

        let kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::CeilingOnly,
        ));
        assert!(kinds.contains(&ValidationErrorKind::CapacityExceeded));
    }

    #[test]
    fn test_floor_violation_only_under_floor_policy() {
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 3, 6))
            .with_booking(Booking::new("B1", "A1", "O1").with_state(BookingState::Accepted))
            .with_booking(Booking::new("B2", "A2", "O1"));
        let outcome = outcome_from(&snapshot);

        let floor_kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::FloorChecked,
        ));
        assert!(floor_kinds.contains(&ValidationErrorKind::BelowCapacityFloor));

        assert!(validate_outcome(&snapshot, &outcome, CapacityPolicy::CeilingOnly).is_ok());
    }

    #[test]
    fn test_untouched_occasion_passes_floor_check() {
        // All bookings left open: floor of 3 does not apply.
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 3, 6))
            .with_booking(Booking::new("B1", "A1", "O1"));
        let outcome = outcome_from(&snapshot);

        assert!(validate_outcome(&snapshot, &outcome, CapacityPolicy::FloorChecked).is_ok());
    }

    #[test]
    fn test_partition_must_cover_every_booking() {
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1"));
        let outcome = MatchOutcome::default();

        let kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::CeilingOnly,
        ));
        assert!(kinds.contains(&ValidationErrorKind::PartitionViolation));
    }

    #[test]
    fn test_partition_disjointness() {
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1").with_state(BookingState::Accepted));
        let mut outcome = outcome_from(&snapshot);
        outcome.open.insert("B1".to_string());

        let kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::CeilingOnly,
        ));
        assert!(kinds.contains(&ValidationErrorKind::PartitionViolation));
    }

    #[test]
    fn test_state_mismatch() {
        let snapshot = Snapshot::new()
            .with_occasion(occasion("O1", 0, 100, 1, 4))
            .with_booking(Booking::new("B1", "A1", "O1"));
        let mut outcome = MatchOutcome::default();
        outcome.accepted.insert("B1".to_string());

        let kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::CeilingOnly,
        ));
        assert!(kinds.contains(&ValidationErrorKind::StateMismatch));
    }

    #[test]
    fn test_unknown_booking_in_partition() {
        let snapshot = Snapshot::new();
        let mut outcome = MatchOutcome::default();
        outcome.accepted.insert("ghost".to_string());

        let kinds = kinds(validate_outcome(
            &snapshot,
            &outcome,
            CapacityPolicy::CeilingOnly,
        ));
        assert!(kinds.contains(&ValidationErrorKind::PartitionViolation));
    }
}
