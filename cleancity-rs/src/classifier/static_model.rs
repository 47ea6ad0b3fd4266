//! Built-in fixed-score model
//!
//! Stands in for a trained network: it checks that the payload is a
//! recognised image format, then reports the arg-max of a fixed score
//! vector over the configured categories.

use cleancity_common::config::ClassifierConfig;

use super::{Classification, ClassificationError, ClassifierModel};

/// Score vector used with the four default categories
pub const DEFAULT_SCORES: [f64; 4] = [0.05, 0.15, 0.70, 0.10];

pub struct StaticScoreModel {
    categories: Vec<String>,
    scores: Vec<f64>,
}

impl StaticScoreModel {
    pub fn new(categories: Vec<String>, scores: Vec<f64>) -> Result<Self, ClassificationError> {
        if categories.is_empty() {
            return Err(ClassificationError::Failed("no categories configured".to_string()));
        }
        if categories.len() != scores.len() {
            return Err(ClassificationError::Failed(format!(
                "{} categories but {} scores",
                categories.len(),
                scores.len()
            )));
        }
        Ok(Self { categories, scores })
    }

    /// Default scores for four categories, a uniform vector otherwise
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassificationError> {
        let n = config.categories.len();
        let scores = if n == DEFAULT_SCORES.len() {
            DEFAULT_SCORES.to_vec()
        } else {
            vec![1.0 / n.max(1) as f64; n]
        };
        Self::new(config.categories.clone(), scores)
    }
}

impl ClassifierModel for StaticScoreModel {
    fn name(&self) -> &str {
        "static-score"
    }

    fn classify(&self, image: &[u8]) -> Result<Classification, ClassificationError> {
        if image.is_empty() {
            return Err(ClassificationError::Failed("empty image payload".to_string()));
        }
        match infer::get(image) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {}
            _ => {
                return Err(ClassificationError::Failed(
                    "payload is not a recognised image format".to_string(),
                ))
            }
        }

        // First maximum wins on ties
        let (index, score) = self
            .scores
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, s)| if s > best.1 { (i, s) } else { best });

        Ok(Classification {
            label: self.categories[index].clone(),
            confidence: (score * 10_000.0).round() / 10_000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest byte prefix `infer` recognises as PNG
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_default_categories_pick_metal() {
        let model = StaticScoreModel::from_config(&ClassifierConfig::default()).unwrap();
        let result = model.classify(&PNG_MAGIC).unwrap();
        assert_eq!(result.label, "Metal");
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_non_image_payload_fails() {
        let model = StaticScoreModel::from_config(&ClassifierConfig::default()).unwrap();
        assert!(matches!(
            model.classify(b"plain text, not an image"),
            Err(ClassificationError::Failed(_))
        ));
        assert!(matches!(model.classify(&[]), Err(ClassificationError::Failed(_))));
    }

    #[test]
    fn test_uniform_scores_tie_break_to_first() {
        let config = ClassifierConfig {
            enabled: true,
            categories: vec!["Glass".into(), "Textile".into(), "E-waste".into()],
        };
        let model = StaticScoreModel::from_config(&config).unwrap();
        let result = model.classify(&PNG_MAGIC).unwrap();
        assert_eq!(result.label, "Glass");
        assert_eq!(result.confidence, 0.3333);
    }

    #[test]
    fn test_mismatched_scores_rejected() {
        assert!(StaticScoreModel::new(vec!["A".into()], vec![0.5, 0.5]).is_err());
        assert!(StaticScoreModel::new(vec![], vec![]).is_err());
    }
}
