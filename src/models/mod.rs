//! Matching domain models.
//!
//! Provides the core data types for representing an allocation run:
//! prioritized requests (bookings), capacity- and time-bounded slots
//! (occasions), and their owners (attendees). Domain-agnostic within
//! matching — the same shapes fit course allocation, activity sign-up,
//! and hospital-residents style assignment.
//!
//! # Domain Mappings
//!
//! | bookmatch | Course Allocation | Activity Sign-up | Residency Matching |
//! |-----------|------------------|------------------|--------------------|
//! | Attendee | Student | Participant | Applicant |
//! | Occasion | Course Section | Activity Slot | Residency Program |
//! | Booking | Enrollment Request | Sign-up | Application |

mod attendee;
mod booking;
mod occasion;
mod snapshot;

pub use attendee::Attendee;
pub use booking::{Booking, BookingState};
pub use occasion::{Occasion, Spots, TimeWindow};
pub use snapshot::Snapshot;
