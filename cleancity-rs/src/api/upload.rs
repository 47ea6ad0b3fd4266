//! Upload endpoint
//!
//! Accepts a JSON body with the image as base64. A `data:` URL prefix, as
//! produced by browser file readers, is stripped before decoding.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use super::RecordView;
use crate::error::{Error, Result};
use crate::services::IngestRequest;
use crate::AppState;

/// POST /api/upload body
///
/// Every field is optional at the parse level so a missing one reports as an
/// invalid observation rather than a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub contributor_id: Option<String>,
    pub image_base64: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl UploadRequest {
    fn into_ingest(self) -> Result<IngestRequest> {
        let contributor_id = required(self.contributor_id, "contributor_id")?;
        let encoded = required(self.image_base64, "image_base64")?;
        let lat = required(self.lat, "lat")?;
        let lng = required(self.lng, "lng")?;

        Ok(IngestRequest {
            contributor_id,
            image: decode_image(&encoded)?,
            lat,
            lng,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::InvalidObservation(format!("{} is required", field)))
}

fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::InvalidObservation(format!("image_base64 is not valid base64: {}", e)))
}

/// POST /api/upload
pub async fn upload_record(
    State(state): State<AppState>,
    body: std::result::Result<Json<UploadRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordView>)> {
    let Json(request) = body.map_err(|e| Error::InvalidObservation(e.body_text()))?;
    let record = state.ingestion.ingest(request.into_ingest()?).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_and_data_url() {
        let plain = STANDARD.encode(b"hello");
        assert_eq!(decode_image(&plain).unwrap(), b"hello");

        let data_url = format!("data:image/png;base64,{}", plain);
        assert_eq!(decode_image(&data_url).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_image("not base64 !!"),
            Err(Error::InvalidObservation(_))
        ));
    }

    #[test]
    fn test_missing_field_is_invalid_observation() {
        let request = UploadRequest {
            contributor_id: Some("alice".into()),
            image_base64: Some(STANDARD.encode(b"x")),
            lat: None,
            lng: Some(77.0),
        };
        match request.into_ingest() {
            Err(Error::InvalidObservation(msg)) => assert!(msg.contains("lat")),
            other => panic!("expected InvalidObservation, got {:?}", other.map(|r| r.lat)),
        }
    }
}
