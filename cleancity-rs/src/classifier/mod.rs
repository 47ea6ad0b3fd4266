//! Classification Gateway
//!
//! Wraps an image classifier behind a narrow contract: image bytes in,
//! `{label, confidence}` out. The gateway is constructed explicitly in a
//! "not ready" state and becomes ready once `initialize` installs a model.
//! After that the model is shared read-only by every request; inference runs
//! on the blocking thread pool.
//!
//! A low-confidence result is a valid result. Only a missing model
//! (`Unavailable`) or a per-input failure (`Failed`) is an error, and the
//! ingestion path downgrades both to the sentinel classification.

mod static_model;

pub use static_model::{StaticScoreModel, DEFAULT_SCORES};

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{info, warn};

/// Label recorded when no classification could be produced
pub const SENTINEL_LABEL: &str = "unclassified";

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

impl Classification {
    /// Stand-in used when classification is unavailable or failed
    pub fn sentinel() -> Self {
        Self {
            label: SENTINEL_LABEL.to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.label == SENTINEL_LABEL && self.confidence == 0.0
    }
}

/// Classification failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// No model has been loaded
    #[error("Classification unavailable: model not loaded")]
    Unavailable,

    /// Decode or inference failed for this particular input
    #[error("Classification failed: {0}")]
    Failed(String),
}

/// A loaded image classification model
///
/// Implementations must be callable from many threads at once.
pub trait ClassifierModel: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Classify one image
    fn classify(&self, image: &[u8]) -> Result<Classification, ClassificationError>;
}

/// Process-wide classifier handle with an explicit readiness state
#[derive(Default)]
pub struct ClassificationGateway {
    model: OnceLock<Arc<dyn ClassifierModel>>,
}

impl ClassificationGateway {
    /// Create a gateway with no model loaded
    pub fn not_ready() -> Self {
        Self::default()
    }

    /// Create a gateway and load `model` immediately
    pub fn with_model(model: Arc<dyn ClassifierModel>) -> Self {
        let gateway = Self::not_ready();
        // A fresh OnceLock is always empty, so this cannot fail
        let _ = gateway.model.set(model);
        gateway
    }

    /// Install the model. Only the first call takes effect.
    ///
    /// Returns false if a model was already installed.
    pub fn initialize(&self, model: Arc<dyn ClassifierModel>) -> bool {
        let name = model.name().to_string();
        match self.model.set(model) {
            Ok(()) => {
                info!(model = %name, "Classifier model loaded");
                true
            }
            Err(_) => {
                warn!(model = %name, "Classifier already initialized, ignoring second model");
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.get().is_some()
    }

    /// Classify an image, surfacing failures to the caller
    pub async fn classify(&self, image: Vec<u8>) -> Result<Classification, ClassificationError> {
        let model = self.model.get().cloned().ok_or(ClassificationError::Unavailable)?;

        let result = tokio::task::spawn_blocking(move || model.classify(&image))
            .await
            .map_err(|e| ClassificationError::Failed(format!("inference task aborted: {}", e)))??;

        check_output(result)
    }

    /// Classify an image, downgrading any failure to the sentinel result
    pub async fn classify_or_sentinel(&self, image: Vec<u8>) -> Classification {
        match self.classify(image).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!(error = %e, "Classification failed, recording sentinel label");
                Classification::sentinel()
            }
        }
    }
}

/// A model that breaks the output contract is treated as an inference failure
fn check_output(result: Classification) -> Result<Classification, ClassificationError> {
    if result.label.trim().is_empty() {
        return Err(ClassificationError::Failed("model returned an empty label".to_string()));
    }
    if !result.confidence.is_finite() || !(0.0..=1.0).contains(&result.confidence) {
        return Err(ClassificationError::Failed(format!(
            "model returned confidence {} outside [0, 1]",
            result.confidence
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Classification);

    impl ClassifierModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn classify(&self, _image: &[u8]) -> Result<Classification, ClassificationError> {
            Ok(self.0.clone())
        }
    }

    fn fixed(label: &str, confidence: f64) -> Arc<dyn ClassifierModel> {
        Arc::new(FixedModel(Classification {
            label: label.to_string(),
            confidence,
        }))
    }

    #[tokio::test]
    async fn test_not_ready_gateway_is_unavailable() {
        let gateway = ClassificationGateway::not_ready();
        assert!(!gateway.is_ready());
        assert_eq!(
            gateway.classify(vec![1, 2, 3]).await,
            Err(ClassificationError::Unavailable)
        );
        assert!(gateway.classify_or_sentinel(vec![1, 2, 3]).await.is_sentinel());
    }

    #[tokio::test]
    async fn test_initialize_once() {
        let gateway = ClassificationGateway::not_ready();
        assert!(gateway.initialize(fixed("Paper", 0.4)));
        assert!(!gateway.initialize(fixed("Metal", 0.9)));

        let result = gateway.classify(vec![0]).await.unwrap();
        assert_eq!(result.label, "Paper");
    }

    #[tokio::test]
    async fn test_low_confidence_is_not_an_error() {
        let gateway = ClassificationGateway::with_model(fixed("Organic", 0.01));
        let result = gateway.classify(vec![0]).await.unwrap();
        assert_eq!(result.confidence, 0.01);
    }

    #[tokio::test]
    async fn test_contract_violation_becomes_failure() {
        let gateway = ClassificationGateway::with_model(fixed("Metal", 1.5));
        assert!(matches!(
            gateway.classify(vec![0]).await,
            Err(ClassificationError::Failed(_))
        ));
        assert!(gateway.classify_or_sentinel(vec![0]).await.is_sentinel());
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_model() {
        let gateway = Arc::new(ClassificationGateway::with_model(fixed("Plastic", 0.7)));
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let gw = Arc::clone(&gateway);
            set.spawn(async move { gw.classify(vec![0]).await });
        }
        while let Some(res) = set.join_next().await {
            assert_eq!(res.unwrap().unwrap().label, "Plastic");
        }
    }
}
