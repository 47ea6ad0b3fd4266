//! Ingestion path
//!
//! Validate → store image → classify → create record. Classification
//! failures never block ingestion: the record is created with the sentinel
//! label so the location and contributor data are kept. If the record cannot
//! be created, the stored image is removed again.

use std::sync::Arc;
use tracing::{info, warn};

use crate::classifier::ClassificationGateway;
use crate::error::{Error, Result};
use crate::models::{validate_location, NewObservation, ObservationRecord};
use crate::services::ImageStore;
use crate::store::RecordStore;

/// Upload as received from the boundary
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub contributor_id: String,
    pub image: Vec<u8>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone)]
pub struct IngestionService {
    gateway: Arc<ClassificationGateway>,
    images: ImageStore,
    store: RecordStore,
}

impl IngestionService {
    pub fn new(gateway: Arc<ClassificationGateway>, images: ImageStore, store: RecordStore) -> Self {
        Self { gateway, images, store }
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<ObservationRecord> {
        if request.contributor_id.trim().is_empty() {
            return Err(Error::InvalidObservation("contributor_id is required".to_string()));
        }
        if request.image.is_empty() {
            return Err(Error::InvalidObservation("image is required".to_string()));
        }
        validate_location(request.lat, request.lng)?;

        let image_ref = self.images.save(&request.image).await?;
        let classification = self.gateway.classify_or_sentinel(request.image).await;

        let new = NewObservation {
            contributor_id: request.contributor_id,
            label: classification.label,
            confidence: classification.confidence,
            lat: request.lat,
            lng: request.lng,
            image_ref: image_ref.clone(),
        };

        match self.store.create(new).await {
            Ok(record) => {
                info!(
                    record_id = %record.id,
                    label = %record.label,
                    confidence = record.confidence,
                    "Upload ingested"
                );
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, image_ref = %image_ref, "Record creation failed, removing image");
                if let Err(cleanup) = self.images.remove(&image_ref).await {
                    warn!(error = %cleanup, "Orphaned image left behind");
                }
                Err(e)
            }
        }
    }
}
