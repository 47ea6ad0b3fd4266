//! Ingestion path tests: validation, image storage, classifier fallback

use cleancity_common::config::ClassifierConfig;
use cleancity_common::db::init_database;
use cleancity_rs::classifier::{
    Classification, ClassificationError, ClassificationGateway, ClassifierModel,
    StaticScoreModel, SENTINEL_LABEL,
};
use cleancity_rs::models::ValidationState;
use cleancity_rs::services::{ImageStore, IngestRequest, IngestionService};
use cleancity_rs::store::RecordStore;
use cleancity_rs::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const PNG_BYTES: [u8; 12] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
];

struct Failing;

impl ClassifierModel for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn classify(&self, _image: &[u8]) -> Result<Classification, ClassificationError> {
        Err(ClassificationError::Failed("model crashed".to_string()))
    }
}

async fn setup(gateway: ClassificationGateway) -> (TempDir, PathBuf, RecordStore, IngestionService) {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("uploads");
    let pool = init_database(&dir.path().join("cleancity.db")).await.unwrap();
    let store = RecordStore::open(pool).await.unwrap();
    let service = IngestionService::new(
        Arc::new(gateway),
        ImageStore::new(uploads.clone()),
        store.clone(),
    );
    (dir, uploads, store, service)
}

fn request(lat: f64, lng: f64) -> IngestRequest {
    IngestRequest {
        contributor_id: "user-1".to_string(),
        image: PNG_BYTES.to_vec(),
        lat,
        lng,
    }
}

fn stored_files(uploads: &Path) -> usize {
    std::fs::read_dir(uploads).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_ingest_classifies_and_stores_pending() {
    let model = StaticScoreModel::from_config(&ClassifierConfig::default()).unwrap();
    let (_dir, uploads, store, service) =
        setup(ClassificationGateway::with_model(Arc::new(model))).await;

    let record = service.ingest(request(12.9716, 77.5946)).await.unwrap();

    assert_eq!(record.label, "Metal");
    assert!((record.confidence - 0.7).abs() < 1e-9);
    assert_eq!(record.state, ValidationState::Pending);
    assert!(record.image_ref.starts_with("uploads/"));
    assert!(record.image_ref.ends_with(".png"));
    assert_eq!(stored_files(&uploads), 1);

    assert_eq!(store.get(record.id).await.unwrap(), record);
}

#[tokio::test]
async fn test_ingest_without_model_records_sentinel() {
    let (_dir, _uploads, _store, service) = setup(ClassificationGateway::not_ready()).await;

    let record = service.ingest(request(1.0, 2.0)).await.unwrap();

    assert_eq!(record.label, SENTINEL_LABEL);
    assert_eq!(record.confidence, 0.0);
    assert_eq!(record.state, ValidationState::Pending);
}

#[tokio::test]
async fn test_ingest_with_failing_model_records_sentinel() {
    let (_dir, _uploads, _store, service) =
        setup(ClassificationGateway::with_model(Arc::new(Failing))).await;

    let record = service.ingest(request(1.0, 2.0)).await.unwrap();
    assert_eq!(record.label, SENTINEL_LABEL);
}

#[tokio::test]
async fn test_ingest_invalid_location_stores_nothing() {
    let (_dir, uploads, store, service) = setup(ClassificationGateway::not_ready()).await;

    let result = service.ingest(request(95.0, 0.0)).await;

    assert!(matches!(result, Err(Error::InvalidObservation(_))));
    assert_eq!(stored_files(&uploads), 0);
    assert_eq!(store.count_by_state(ValidationState::Pending).await.unwrap(), 0);
}

#[tokio::test]
async fn test_ingest_requires_image_and_contributor() {
    let (_dir, _uploads, _store, service) = setup(ClassificationGateway::not_ready()).await;

    let no_image = IngestRequest { image: Vec::new(), ..request(1.0, 1.0) };
    assert!(matches!(
        service.ingest(no_image).await,
        Err(Error::InvalidObservation(_))
    ));

    let no_contributor = IngestRequest { contributor_id: " ".to_string(), ..request(1.0, 1.0) };
    assert!(matches!(
        service.ingest(no_contributor).await,
        Err(Error::InvalidObservation(_))
    ));
}

#[tokio::test]
async fn test_gateway_initializes_once() {
    let gateway = ClassificationGateway::not_ready();
    assert!(!gateway.is_ready());
    assert!(matches!(
        gateway.classify(PNG_BYTES.to_vec()).await,
        Err(ClassificationError::Unavailable)
    ));

    assert!(gateway.initialize(Arc::new(Failing)));
    assert!(gateway.is_ready());

    let model = StaticScoreModel::from_config(&ClassifierConfig::default()).unwrap();
    assert!(!gateway.initialize(Arc::new(model)), "second model is ignored");
    assert!(matches!(
        gateway.classify(PNG_BYTES.to_vec()).await,
        Err(ClassificationError::Failed(_))
    ));
}

#[tokio::test]
async fn test_ingest_removes_image_when_record_creation_fails() {
    let (_dir, uploads, store, service) = setup(ClassificationGateway::not_ready()).await;
    store.pool().close().await;

    let result = service.ingest(request(1.0, 2.0)).await;

    assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    assert_eq!(stored_files(&uploads), 0, "image must not outlive a failed create");
}
