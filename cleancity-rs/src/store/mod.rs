//! Record Store
//!
//! Sole writer of observation state. Every mutation is a single SQL
//! statement, so a record is either fully written or not written at all, and
//! readers never see a half-applied decision.
//!
//! Decisions are a compare-and-set on `state = 'pending'`: when several
//! callers decide the same record concurrently, exactly one UPDATE matches
//! and the rest observe `AlreadyDecided`.

mod clock;
mod rows;

pub use clock::MonotonicClock;

use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    ApprovedPoint, Decision, NewObservation, ObservationRecord, SortOrder, ValidationState,
};
use rows::{ObservationRow, RECORD_COLUMNS};

/// Handle to the observation table; cheap to clone
#[derive(Clone)]
pub struct RecordStore {
    db: SqlitePool,
    clock: Arc<MonotonicClock>,
    /// Bumped after every committed transition into `approved`
    approved_generation: Arc<AtomicU64>,
}

impl RecordStore {
    /// Wrap an initialized pool
    ///
    /// The clock is seeded from the newest stored timestamp so timestamps
    /// keep increasing across restarts.
    pub async fn open(db: SqlitePool) -> Result<Self> {
        let latest: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(COALESCE(MAX(created_at), 0), COALESCE(MAX(decided_at), 0)) FROM observations",
        )
        .fetch_one(&db)
        .await?;

        Ok(Self {
            db,
            clock: Arc::new(MonotonicClock::starting_after(latest.unwrap_or(0))),
            approved_generation: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Changes whenever the approved set grows
    pub fn approved_generation(&self) -> u64 {
        self.approved_generation.load(Ordering::SeqCst)
    }

    /// Validate and persist a new `pending` record
    pub async fn create(&self, new: NewObservation) -> Result<ObservationRecord> {
        new.validate()?;

        let created_us = self.clock.now_micros();
        let created_at = clock::from_micros(created_us)
            .ok_or_else(|| Error::StorageUnavailable("clock out of range".to_string()))?;

        let record = ObservationRecord {
            id: Uuid::new_v4(),
            contributor_id: new.contributor_id.trim().to_string(),
            label: new.label.trim().to_string(),
            confidence: new.confidence,
            lat: new.lat,
            lng: new.lng,
            image_ref: new.image_ref,
            created_at,
            state: ValidationState::Pending,
            validation: None,
        };

        sqlx::query(
            r#"
            INSERT INTO observations (
                id, contributor_id, label, confidence, lat, lng, image_ref, created_at, state
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(record.id.to_string())
        .bind(&record.contributor_id)
        .bind(&record.label)
        .bind(record.confidence)
        .bind(record.lat)
        .bind(record.lng)
        .bind(&record.image_ref)
        .bind(created_us)
        .execute(&self.db)
        .await?;

        info!(
            record_id = %record.id,
            contributor = %record.contributor_id,
            label = %record.label,
            "Observation recorded"
        );

        Ok(record)
    }

    /// Fetch one record by id
    pub async fn get(&self, id: Uuid) -> Result<ObservationRecord> {
        let sql = format!("SELECT {} FROM observations WHERE id = ?", RECORD_COLUMNS);
        let row: Option<ObservationRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;

        row.ok_or_else(|| Error::NotFound(id.to_string()))?.try_into()
    }

    /// Move a pending record into a terminal state
    ///
    /// Fails with `NotFound` for unknown ids and `AlreadyDecided` when the
    /// record is no longer pending. The stored decision is never overwritten.
    pub async fn decide(
        &self,
        id: Uuid,
        decision: Decision,
        decider: &str,
        note: Option<String>,
    ) -> Result<ObservationRecord> {
        let decider = decider.trim();
        if decider.is_empty() {
            return Err(Error::InvalidInput("decider is required".to_string()));
        }
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let target = decision.target_state();
        let decided_us = self.clock.now_micros();

        let sql = format!(
            r#"
            UPDATE observations
            SET state = ?, decided_by = ?, decided_at = MAX(?, created_at), note = ?
            WHERE id = ? AND state = 'pending'
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );
        let updated: Option<ObservationRow> = sqlx::query_as(&sql)
            .bind(target.as_str())
            .bind(decider)
            .bind(decided_us)
            .bind(note.as_deref())
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;

        match updated {
            Some(row) => {
                if target == ValidationState::Approved {
                    self.approved_generation.fetch_add(1, Ordering::SeqCst);
                }
                info!(record_id = %id, state = %target, decider = %decider, "Record decided");
                row.try_into()
            }
            None => {
                let current: Option<String> =
                    sqlx::query_scalar("SELECT state FROM observations WHERE id = ?")
                        .bind(id.to_string())
                        .fetch_optional(&self.db)
                        .await?;

                match current {
                    None => Err(Error::NotFound(id.to_string())),
                    Some(state) => {
                        let state: ValidationState =
                            state.parse().map_err(Error::StorageUnavailable)?;
                        warn!(
                            record_id = %id,
                            current = %state,
                            attempted = %target,
                            "Rejected decision on already-decided record"
                        );
                        Err(Error::AlreadyDecided { id, state })
                    }
                }
            }
        }
    }

    /// Records in `state`, ordered by creation time then insertion order
    pub async fn list_by_state(
        &self,
        state: ValidationState,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<ObservationRecord>> {
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let sql = format!(
            "SELECT {} FROM observations WHERE state = ?
             ORDER BY created_at {dir}, seq {dir} LIMIT ?",
            RECORD_COLUMNS,
            dir = direction
        );

        let rows: Vec<ObservationRow> = sqlx::query_as(&sql)
            .bind(state.as_str())
            .bind(limit_to_sql(limit))
            .fetch_all(&self.db)
            .await?;

        debug!(state = %state, count = rows.len(), "Listed records");
        rows.into_iter().map(ObservationRecord::try_from).collect()
    }

    pub async fn count_by_state(&self, state: ValidationState) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations WHERE state = ?")
            .bind(state.as_str())
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Whether `image_ref` belongs to an approved record
    pub async fn is_approved_image(&self, image_ref: &str) -> Result<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM observations WHERE image_ref = ? AND state = 'approved')",
        )
        .bind(image_ref)
        .fetch_one(&self.db)
        .await?;
        Ok(found != 0)
    }

    /// Contributor and location of every approved record
    ///
    /// One statement, so the result is a single consistent snapshot.
    pub async fn approved_points(&self) -> Result<Vec<ApprovedPoint>> {
        let rows: Vec<(String, f64, f64)> = sqlx::query_as(
            "SELECT contributor_id, lat, lng FROM observations WHERE state = 'approved'",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(contributor_id, lat, lng)| ApprovedPoint { contributor_id, lat, lng })
            .collect())
    }
}

fn limit_to_sql(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
