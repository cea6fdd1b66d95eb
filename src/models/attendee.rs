//! Attendee (requester) model.

use serde::{Deserialize, Serialize};

/// A requester owning zero or more bookings.
///
/// Attendees carry no mutable state beyond their booking set; the set is
/// pre-resolved when the snapshot is loaded so no lookups happen during
/// matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    /// Unique attendee identifier.
    pub id: String,
    /// Ids of this attendee's bookings.
    pub booking_ids: Vec<String>,
}

impl Attendee {
    /// Creates a new attendee without bookings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            booking_ids: Vec::new(),
        }
    }

    /// Whether this attendee has any bookings. An attendee without
    /// bookings is a valid, expected state.
    pub fn has_bookings(&self) -> bool {
        !self.booking_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendee() {
        let mut a = Attendee::new("A1");
        assert!(!a.has_bookings());
        a.booking_ids.push("B1".into());
        assert!(a.has_bookings());
    }
}
