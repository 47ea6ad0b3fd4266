//! Derived, non-persisted aggregate views

use serde::{Deserialize, Serialize};

/// The slice of an approved record the aggregations need
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedPoint {
    pub contributor_id: String,
    pub lat: f64,
    pub lng: f64,
}

/// Per-contributor count of approved records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub contributor_id: String,
    /// One point per approved record
    pub total_points: u64,
}

/// Grid cell at a fixed decimal precision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotBin {
    pub lat: f64,
    pub lng: f64,
    pub count: u64,
}
