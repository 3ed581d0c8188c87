//! Scaling + prediction for feature vectors.

use std::sync::Arc;

use crate::features::FeatureVector;
use crate::model::Regressor;
use crate::scaler::FeatureScaler;
use civicrank_common::{PipelineError, Result};

/// Score one vector: `model.predict(scaler.transform(x))`.
pub fn score(
    features: &[f64],
    scaler: &dyn FeatureScaler,
    model: &dyn Regressor,
) -> Result<f64> {
    let scaled = scaler.transform(features)?;
    model.predict(&scaled)
}

/// A matched scaler/model pair. Read-only once built, cheap to share.
#[derive(Clone)]
pub struct Scorer {
    scaler: Arc<dyn FeatureScaler>,
    model: Arc<dyn Regressor>,
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("n_features", &self.n_features())
            .finish()
    }
}

impl Scorer {
    /// Pair a scaler with a model. Their widths must agree.
    pub fn new(scaler: Arc<dyn FeatureScaler>, model: Arc<dyn Regressor>) -> Result<Self> {
        if scaler.n_features() != model.n_features() {
            return Err(PipelineError::FeatureWidth {
                expected: model.n_features(),
                actual: scaler.n_features(),
            });
        }
        Ok(Self { scaler, model })
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    pub fn score(&self, features: &FeatureVector) -> Result<f64> {
        score(features, self.scaler.as_ref(), self.model.as_ref())
    }

    /// Score every row of a feature matrix, in order.
    pub fn score_batch(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.score(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelArtifact;
    use crate::scaler::ScalerArtifact;

    fn linear_scorer() -> Scorer {
        let scaler = ScalerArtifact::Standard {
            mean: vec![0.5, 5.0, 3.0, 3.0],
            scale: vec![0.5, 1.0, 1.0, 1.0],
        };
        let model = ModelArtifact::Linear {
            coefficients: vec![1.0, 1.0, 1.0, 1.0],
            intercept: 10.0,
        };
        Scorer::new(Arc::new(scaler), Arc::new(model)).unwrap()
    }

    #[test]
    fn test_score_applies_scaler_before_model() {
        let scorer = linear_scorer();
        // scaled: [1.0, -2.0, 1.0, 2.0] → 10 + 2
        assert_eq!(scorer.score(&[1.0, 3.0, 4.0, 5.0]).unwrap(), 12.0);
    }

    #[test]
    fn test_score_batch_preserves_order() {
        let scorer = linear_scorer();
        let scores = scorer
            .score_batch(&[[0.5, 5.0, 3.0, 3.0], [1.0, 3.0, 4.0, 5.0]])
            .unwrap();
        assert_eq!(scores, vec![10.0, 12.0]);
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let scaler = ScalerArtifact::Identity { n_features: 3 };
        let model = ModelArtifact::Linear { coefficients: vec![1.0; 4], intercept: 0.0 };
        let err = Scorer::new(Arc::new(scaler), Arc::new(model)).unwrap_err();
        assert!(matches!(err, PipelineError::FeatureWidth { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_free_function_matches_scorer() {
        let scaler = ScalerArtifact::Identity { n_features: 4 };
        let model = ModelArtifact::Linear { coefficients: vec![0.0, 0.0, 0.0, 2.0], intercept: 0.0 };
        assert_eq!(score(&[9.0, 9.0, 9.0, 1.5], &scaler, &model).unwrap(), 3.0);
    }
}
