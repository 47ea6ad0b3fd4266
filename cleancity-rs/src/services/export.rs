//! CSV export of approved records
//!
//! Reads approved records only, oldest first. Fields are quoted per RFC 4180
//! when they contain a comma, quote, or line break.

use chrono::SecondsFormat;

use crate::error::{Error, Result};
use crate::models::{ObservationRecord, SortOrder, ValidationState};
use crate::store::RecordStore;

pub const CSV_HEADER: [&str; 12] = [
    "id",
    "contributor_id",
    "label",
    "confidence",
    "lat",
    "lng",
    "image_ref",
    "created_at",
    "state",
    "decided_by",
    "decided_at",
    "note",
];

/// Suggested download name
pub const EXPORT_FILE_NAME: &str = "cleancity_export.csv";

#[derive(Clone)]
pub struct ExportProducer {
    store: RecordStore,
}

impl ExportProducer {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Render every approved record; `NotFound` when there are none
    pub async fn approved_csv(&self) -> Result<String> {
        let records = self
            .store
            .list_by_state(ValidationState::Approved, SortOrder::Asc, usize::MAX)
            .await?;

        if records.is_empty() {
            return Err(Error::NotFound("no approved records to export".to_string()));
        }

        Ok(render_csv(&records))
    }
}

pub fn render_csv(records: &[ObservationRecord]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for record in records {
        let meta = record.validation.as_ref();
        let row = [
            record.id.to_string(),
            record.contributor_id.clone(),
            record.label.clone(),
            record.confidence.to_string(),
            record.lat.to_string(),
            record.lng.to_string(),
            record.image_ref.clone(),
            record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            record.state.to_string(),
            meta.map(|m| m.decided_by.clone()).unwrap_or_default(),
            meta.map(|m| m.decided_at.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default(),
            meta.and_then(|m| m.note.clone()).unwrap_or_default(),
        ];

        let fields: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
