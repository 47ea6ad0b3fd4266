//! Leaderboard and hotspot algorithms
//!
//! Pure functions over a snapshot of approved records. Both group with a hash
//! map and then sort on a total order, so the output depends only on the
//! multiset of input points and never on their order.

use std::collections::HashMap;

use crate::models::{ApprovedPoint, HotspotBin, LeaderboardEntry};

/// Count approved records per contributor
///
/// Sorted by count descending, then contributor id ascending; at most `limit`.
pub fn leaderboard(points: &[ApprovedPoint], limit: usize) -> Vec<LeaderboardEntry> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for point in points {
        *counts.entry(point.contributor_id.as_str()).or_insert(0) += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = counts
        .into_iter()
        .map(|(contributor_id, total_points)| LeaderboardEntry {
            contributor_id: contributor_id.to_string(),
            total_points,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.contributor_id.cmp(&b.contributor_id))
    });
    entries.truncate(limit);
    entries
}

/// Integer grid index of a coordinate at `precision` decimal places
///
/// Rounds half away from zero (`f64::round`) on `coord * 10^precision`.
/// Bins are keyed by this index rather than by the rounded float, so two
/// coordinates land in the same bin exactly when their indices are equal.
pub fn grid_index(coord: f64, precision: u32) -> i64 {
    (coord * scale(precision)).round() as i64
}

fn scale(precision: u32) -> f64 {
    10f64.powi(precision as i32)
}

/// Snap approved records to a grid and count records per cell
///
/// Sorted by count descending, then (lat, lng) ascending; at most `limit`.
pub fn hotspots(points: &[ApprovedPoint], precision: u32, limit: usize) -> Vec<HotspotBin> {
    let mut bins: HashMap<(i64, i64), u64> = HashMap::new();
    for point in points {
        let key = (grid_index(point.lat, precision), grid_index(point.lng, precision));
        *bins.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<((i64, i64), u64)> = bins.into_iter().collect();
    ranked.sort_by(|(key_a, count_a), (key_b, count_b)| {
        count_b.cmp(count_a).then_with(|| key_a.cmp(key_b))
    });
    ranked.truncate(limit);

    let s = scale(precision);
    ranked
        .into_iter()
        .map(|((lat_idx, lng_idx), count)| HotspotBin {
            lat: lat_idx as f64 / s,
            lng: lng_idx as f64 / s,
            count,
        })
        .collect()
}
