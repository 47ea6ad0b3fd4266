//! Domain models for the record service

pub mod aggregates;
pub mod observation;

pub use aggregates::{ApprovedPoint, HotspotBin, LeaderboardEntry};
pub use observation::{
    validate_location, Decision, NewObservation, ObservationRecord, SortOrder, ValidationMeta,
    ValidationState,
};
