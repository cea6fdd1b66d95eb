//! Booking (demand-side request) model.
//!
//! A booking is one attendee's request for one occasion, carrying a
//! priority and a tri-state outcome. The matching algorithms only ever
//! rewrite `state`; identity and references are fixed at load time.

use serde::{Deserialize, Serialize};

/// Outcome state of a booking.
///
/// Every booking is in exactly one state at all times. The wire names
/// match the external store (`open` / `accepted` / `blocked`; some callers
/// use the equivalent unconfirmed / confirmed / cancelled terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    /// Not yet decided; eligible for future rounds.
    Open,
    /// Holds a spot on its occasion.
    Accepted,
    /// Forced out because an overlapping booking of the same attendee
    /// was accepted.
    Blocked,
}

impl Default for BookingState {
    fn default() -> Self {
        Self::Open
    }
}

/// One attendee's request for one occasion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: String,
    /// Owning attendee.
    pub attendee_id: String,
    /// Requested occasion.
    pub occasion_id: String,
    /// Preference strength (higher = stronger). Sole tie-break between
    /// competing bookings for the same occasion.
    pub priority: i32,
    /// Current outcome state.
    pub state: BookingState,
}

impl Booking {
    /// Creates a new open booking.
    pub fn new(
        id: impl Into<String>,
        attendee_id: impl Into<String>,
        occasion_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            attendee_id: attendee_id.into(),
            occasion_id: occasion_id.into(),
            priority: 0,
            state: BookingState::Open,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the state.
    pub fn with_state(mut self, state: BookingState) -> Self {
        self.state = state;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_builder() {
        let b = Booking::new("B1", "A1", "O1").with_priority(1);
        assert_eq!(b.id, "B1");
        assert_eq!(b.attendee_id, "A1");
        assert_eq!(b.occasion_id, "O1");
        assert_eq!(b.priority, 1);
        assert_eq!(b.state, BookingState::Open);
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&BookingState::Accepted).unwrap(),
            "\"accepted\""
        );
        let s: BookingState = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(s, BookingState::Blocked);
    }
}
