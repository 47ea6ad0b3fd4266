//! Services built on the Record Store

pub mod export;
pub mod image_store;
pub mod ingest;

pub use export::ExportProducer;
pub use image_store::ImageStore;
pub use ingest::{IngestRequest, IngestionService};
