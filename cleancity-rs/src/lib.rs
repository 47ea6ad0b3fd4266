//! cleancity-rs library - Observation record service
//!
//! Ingests classified, geotagged waste sightings, runs them through admin
//! validation, and serves the approved set as recent records, a contributor
//! leaderboard, hotspot bins and a CSV export.

pub mod aggregation;
pub mod api;
pub mod classifier;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod workflow;

pub use crate::error::{Error, Result};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use cleancity_common::config::AggregationConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use aggregation::AggregationEngine;
use classifier::ClassificationGateway;
use services::{ExportProducer, ImageStore, IngestionService};
use store::RecordStore;
use workflow::ValidationWorkflow;

/// Largest accepted request body (base64 inflates images by a third)
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub gateway: Arc<ClassificationGateway>,
    pub ingestion: IngestionService,
    pub workflow: ValidationWorkflow,
    pub aggregation: AggregationEngine,
    pub export: ExportProducer,
    /// Required on admin routes; `None` disables admin auth
    pub admin_token: Option<Arc<str>>,
    pub uploads_dir: PathBuf,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire every component around one store
    pub fn new(
        store: RecordStore,
        gateway: Arc<ClassificationGateway>,
        uploads_dir: PathBuf,
        settings: AggregationConfig,
    ) -> Self {
        let images = ImageStore::new(uploads_dir.clone());
        Self {
            ingestion: IngestionService::new(Arc::clone(&gateway), images, store.clone()),
            workflow: ValidationWorkflow::new(store.clone()),
            aggregation: AggregationEngine::new(store.clone(), settings),
            export: ExportProducer::new(store.clone()),
            store,
            gateway,
            admin_token: None,
            uploads_dir,
            startup_time: Utc::now(),
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.map(Arc::from);
        self
    }
}

/// Build application router
///
/// Admin routes sit behind the token middleware. Stored images are served
/// only for approved records, except to admins.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let admin = Router::new()
        .route("/api/admin/pending", get(api::review_queue))
        .route("/api/admin/records/:id", get(api::get_any_record))
        .route("/api/admin/validate/:id", post(api::validate_record))
        .route("/api/admin/export", get(api::export_records))
        .layer(middleware::from_fn_with_state(state.clone(), api::admin_auth));

    let public = Router::new()
        .route("/api/upload", post(api::upload_record))
        .route("/api/records", get(api::recent_records))
        .route("/api/records/:id", get(api::get_record))
        .route("/api/leaderboard", get(api::leaderboard))
        .route("/api/hotspots", get(api::hotspots))
        .merge(api::health_routes());

    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(middleware::from_fn_with_state(state.clone(), api::image_access));

    Router::new()
        .merge(admin)
        .merge(public)
        .merge(uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
