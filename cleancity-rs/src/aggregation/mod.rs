//! Aggregation Engine
//!
//! Read-only views over approved records: the contributor leaderboard and
//! hotspot bins. Each computation reads the approved set with one query, so
//! a result always reflects a single snapshot of the store.
//!
//! Results are cached per parameter set and tagged with the store's
//! approved-set generation. An entry is served only while that generation is
//! current, so any approval invalidates every cached view.

pub mod binning;

use cleancity_common::config::{AggregationConfig, MAX_HOTSPOT_PRECISION};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{HotspotBin, LeaderboardEntry};
use crate::store::RecordStore;

/// Upper bound on cached parameter sets per view
const MAX_CACHE_ENTRIES: usize = 64;

#[derive(Clone)]
pub struct AggregationEngine {
    store: RecordStore,
    settings: AggregationConfig,
    leaderboards: Arc<ViewCache<usize, LeaderboardEntry>>,
    hotspots: Arc<ViewCache<(u32, usize), HotspotBin>>,
}

impl AggregationEngine {
    pub fn new(store: RecordStore, settings: AggregationConfig) -> Self {
        Self {
            store,
            settings,
            leaderboards: Arc::new(ViewCache::default()),
            hotspots: Arc::new(ViewCache::default()),
        }
    }

    pub fn settings(&self) -> &AggregationConfig {
        &self.settings
    }

    /// Top contributors by approved record count
    pub async fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>> {
        let limit = resolve_limit(limit, self.settings.leaderboard_limit, self.settings.max_query_limit)?;

        let generation = self.store.approved_generation();
        if let Some(hit) = self.leaderboards.get(&limit, generation) {
            debug!(limit, generation, "Leaderboard served from cache");
            return Ok(hit);
        }

        let points = self.store.approved_points().await?;
        let view = binning::leaderboard(&points, limit);
        self.leaderboards.put(limit, generation, view.clone());
        Ok(view)
    }

    /// Densest grid cells of approved records
    pub async fn hotspots(
        &self,
        precision: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<HotspotBin>> {
        let precision = precision.unwrap_or(self.settings.hotspot_precision);
        if precision > MAX_HOTSPOT_PRECISION {
            return Err(Error::InvalidInput(format!(
                "precision must be 0..={}, got {}",
                MAX_HOTSPOT_PRECISION, precision
            )));
        }
        let limit = resolve_limit(limit, self.settings.hotspot_limit, self.settings.max_query_limit)?;

        let generation = self.store.approved_generation();
        let key = (precision, limit);
        if let Some(hit) = self.hotspots.get(&key, generation) {
            debug!(precision, limit, generation, "Hotspots served from cache");
            return Ok(hit);
        }

        let points = self.store.approved_points().await?;
        let view = binning::hotspots(&points, precision, limit);
        self.hotspots.put(key, generation, view.clone());
        Ok(view)
    }
}

/// Apply the default when absent, reject zero, cap at `max`
pub fn resolve_limit(requested: Option<usize>, default: usize, max: usize) -> Result<usize> {
    match requested {
        None => Ok(default.min(max)),
        Some(0) => Err(Error::InvalidInput("limit must be >= 1".to_string())),
        Some(n) => Ok(n.min(max)),
    }
}

/// Generation-tagged result cache for one view type
struct ViewCache<K, V> {
    entries: Mutex<HashMap<K, (u64, Vec<V>)>>,
}

impl<K, V> Default for ViewCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ViewCache<K, V> {
    fn get(&self, key: &K, generation: u64) -> Option<Vec<V>> {
        let entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((g, view)) if *g == generation => Some(view.clone()),
            _ => None,
        }
    }

    /// Store a view computed from a snapshot taken at `generation`
    fn put(&self, key: K, generation: u64, view: Vec<V>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.retain(|_, (g, _)| *g >= generation);
        if entries.len() >= MAX_CACHE_ENTRIES {
            entries.clear();
        }
        entries.insert(key, (generation, view));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 20, 1000).unwrap(), 20);
        assert_eq!(resolve_limit(Some(5), 20, 1000).unwrap(), 5);
        assert_eq!(resolve_limit(Some(5000), 20, 1000).unwrap(), 1000);
        assert!(matches!(resolve_limit(Some(0), 20, 1000), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_view_cache_respects_generation() {
        let cache: ViewCache<usize, u32> = ViewCache::default();
        cache.put(10, 3, vec![1, 2, 3]);

        assert_eq!(cache.get(&10, 3), Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&10, 4), None);
        assert_eq!(cache.get(&11, 3), None);
    }

    #[test]
    fn test_view_cache_drops_older_generations() {
        let cache: ViewCache<usize, u32> = ViewCache::default();
        cache.put(1, 1, vec![1]);
        cache.put(2, 2, vec![2]);

        assert_eq!(cache.get(&1, 1), None);
        assert_eq!(cache.get(&2, 2), Some(vec![2]));
    }
}
