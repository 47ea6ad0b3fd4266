//! HTTP API handlers for cleancity-rs

pub mod admin;
pub mod auth;
pub mod data;
pub mod health;
pub mod upload;

pub use admin::{export_records, get_any_record, review_queue, validate_record};
pub use auth::{admin_auth, image_access};
pub use data::{get_record, hotspots, leaderboard, recent_records};
pub use health::health_routes;
pub use upload::upload_record;

use axum::extract::{rejection::QueryRejection, Query};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Error;
use crate::models::ObservationRecord;

/// Record as returned over HTTP, with the derived `validated` flag
#[derive(Debug, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: ObservationRecord,
    pub validated: bool,
}

impl From<ObservationRecord> for RecordView {
    fn from(record: ObservationRecord) -> Self {
        let validated = record.is_validated();
        Self { record, validated }
    }
}

/// A path segment that is not a UUID cannot name a stored record
pub(crate) fn parse_record_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::NotFound(raw.to_string()))
}

/// Malformed query strings report as `InvalidInput` with the usual JSON body
pub(crate) fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Error> {
    query
        .map(|Query(inner)| inner)
        .map_err(|e| Error::InvalidInput(e.body_text()))
}
