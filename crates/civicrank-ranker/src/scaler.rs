//! Pre-fit feature scalers.
//! The parameters come from an artifact; nothing here fits them.

use serde::{Deserialize, Serialize};

use civicrank_common::{PipelineError, Result};

/// A fixed affine normalisation applied before prediction.
pub trait FeatureScaler: Send + Sync {
    /// Width of the vectors this scaler accepts.
    fn n_features(&self) -> usize;

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// Serialized scaler parameters, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// Pass-through, for models trained on raw features.
    Identity { n_features: usize },
}

impl ScalerArtifact {
    /// Check internal consistency. Returns a human-readable reason on failure.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let (a, b, names) = match self {
            ScalerArtifact::Standard { mean, scale } => (mean, scale, ("mean", "scale")),
            ScalerArtifact::MinMax { min, scale } => (min, scale, ("min", "scale")),
            ScalerArtifact::Identity { n_features } => {
                return if *n_features == 0 {
                    Err("identity scaler with zero features".to_string())
                } else {
                    Ok(())
                };
            }
        };
        if a.is_empty() {
            return Err(format!("`{}` is empty", names.0));
        }
        if a.len() != b.len() {
            return Err(format!(
                "`{}` has {} values but `{}` has {}",
                names.0,
                a.len(),
                names.1,
                b.len()
            ));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err("non-finite scaler parameter".to_string());
        }
        Ok(())
    }
}

impl FeatureScaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        match self {
            ScalerArtifact::Standard { mean, .. } => mean.len(),
            ScalerArtifact::MinMax { min, .. } => min.len(),
            ScalerArtifact::Identity { n_features } => *n_features,
        }
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(PipelineError::FeatureWidth {
                expected,
                actual: features.len(),
            });
        }

        let scaled = match self {
            ScalerArtifact::Standard { mean, scale } => features
                .iter()
                .zip(mean.iter().zip(scale.iter()))
                .map(|(x, (m, s))| {
                    // Constant features were fitted with zero variance.
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (x - m) / s
                })
                .collect(),
            ScalerArtifact::MinMax { min, scale } => features
                .iter()
                .zip(min.iter().zip(scale.iter()))
                .map(|(x, (m, s))| x * s + m)
                .collect(),
            ScalerArtifact::Identity { .. } => features.to_vec(),
        };
        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaling() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![0.5, 5.0, 3.0, 3.0],
            scale: vec![0.25, 2.0, 1.0, 0.0],
        };
        let out = scaler.transform(&[1.0, 7.0, 3.0, 4.0]).unwrap();
        assert_eq!(out, vec![2.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_minmax_scaling() {
        // Fitted on [0, 10] → [0, 1]: scale = 0.1, min = 0.
        // Fitted on [1, 5]  → [0, 1]: scale = 0.25, min = -0.25.
        let scaler = ScalerArtifact::MinMax {
            min: vec![0.0, -0.25],
            scale: vec![0.1, 0.25],
        };
        let out = scaler.transform(&[5.0, 5.0]).unwrap();
        assert!((out[0] - 0.5).abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let scaler = ScalerArtifact::Identity { n_features: 4 };
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureWidth { expected: 4, actual: 2 }
        ));
    }

    #[test]
    fn test_validate_catches_length_mismatch() {
        let scaler = ScalerArtifact::Standard {
            mean: vec![0.0, 0.0],
            scale: vec![1.0],
        };
        assert!(scaler.validate().is_err());
        assert!(ScalerArtifact::Identity { n_features: 0 }.validate().is_err());
    }

    #[test]
    fn test_artifact_json_shape() {
        let json = r#"{"kind":"standard","mean":[1.0,2.0],"scale":[0.5,0.5]}"#;
        let scaler: ScalerArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(scaler.n_features(), 2);
        assert!(scaler.validate().is_ok());
    }
}
