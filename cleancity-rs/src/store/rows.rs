//! Row mapping for the `observations` table

use uuid::Uuid;

use super::clock::from_micros;
use crate::error::{Error, Result};
use crate::models::{ObservationRecord, ValidationMeta, ValidationState};

/// Column list shared by every SELECT/RETURNING in the store
pub(crate) const RECORD_COLUMNS: &str = "id, contributor_id, label, confidence, lat, lng, \
     image_ref, created_at, state, decided_by, decided_at, note";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ObservationRow {
    pub id: String,
    pub contributor_id: String,
    pub label: String,
    pub confidence: f64,
    pub lat: f64,
    pub lng: f64,
    pub image_ref: String,
    pub created_at: i64,
    pub state: String,
    pub decided_by: Option<String>,
    pub decided_at: Option<i64>,
    pub note: Option<String>,
}

impl TryFrom<ObservationRow> for ObservationRecord {
    type Error = Error;

    fn try_from(row: ObservationRow) -> Result<Self> {
        let corrupt = |what: &str| Error::StorageUnavailable(format!("corrupt row {}: {}", row.id, what));

        let id = Uuid::parse_str(&row.id).map_err(|_| corrupt("id"))?;
        let state: ValidationState = row.state.parse().map_err(|e: String| corrupt(&e))?;
        let created_at = from_micros(row.created_at).ok_or_else(|| corrupt("created_at"))?;

        let validation = match (state, row.decided_by, row.decided_at) {
            (ValidationState::Pending, None, None) => None,
            (ValidationState::Pending, _, _) => return Err(corrupt("pending row has decision")),
            (_, Some(decided_by), Some(decided_at)) => Some(ValidationMeta {
                decided_by,
                decided_at: from_micros(decided_at).ok_or_else(|| corrupt("decided_at"))?,
                note: row.note,
            }),
            _ => return Err(corrupt("decided row missing decision")),
        };

        Ok(ObservationRecord {
            id,
            contributor_id: row.contributor_id,
            label: row.label,
            confidence: row.confidence,
            lat: row.lat,
            lng: row.lng,
            image_ref: row.image_ref,
            created_at,
            state,
            validation,
        })
    }
}
