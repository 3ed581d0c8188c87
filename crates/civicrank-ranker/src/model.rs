//! Pre-trained regression models.
//!
//! The model is an opaque `vector -> scalar` function as far as the rest of the
//! crate is concerned. Two artifact kinds are understood: a random forest exported
//! as flat node arrays, and a plain linear model.

use serde::{Deserialize, Serialize};

use civicrank_common::{PipelineError, Result};

/// Any function from a scaled feature vector to a score.
pub trait Regressor: Send + Sync {
    /// Width of the vectors this model accepts.
    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<f64>;
}

/// One node of an exported decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes to `left`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

/// Nodes in pre-order; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, threshold, left, right } = node {
                if *feature >= n_features {
                    return Err(format!("node {idx} splits on feature {feature} of {n_features}"));
                }
                if threshold.is_nan() {
                    return Err(format!("node {idx} has a NaN threshold"));
                }
                // Children must point forward so traversal always terminates.
                for child in [left, right] {
                    if *child <= idx || *child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child index {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Assumes `validate` passed.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if features[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Serialized model, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Mean of the tree predictions.
    RandomForest {
        n_features: usize,
        trees: Vec<DecisionTree>,
    },
    /// `intercept + Σ coefficients[i] * x[i]`
    Linear { coefficients: Vec<f64>, intercept: f64 },
}

impl ModelArtifact {
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            ModelArtifact::RandomForest { n_features, trees } => {
                if *n_features == 0 {
                    return Err("random forest with zero features".to_string());
                }
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(*n_features).map_err(|e| format!("tree {i}: {e}"))?;
                }
                Ok(())
            }
            ModelArtifact::Linear { coefficients, intercept } => {
                if coefficients.is_empty() {
                    return Err("linear model has no coefficients".to_string());
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("non-finite linear model parameter".to_string());
                }
                Ok(())
            }
        }
    }
}

impl Regressor for ModelArtifact {
    fn n_features(&self) -> usize {
        match self {
            ModelArtifact::RandomForest { n_features, .. } => *n_features,
            ModelArtifact::Linear { coefficients, .. } => coefficients.len(),
        }
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(PipelineError::FeatureWidth {
                expected,
                actual: features.len(),
            });
        }

        let score = match self {
            ModelArtifact::RandomForest { trees, .. } => {
                let sum: f64 = trees.iter().map(|t| t.predict(features)).sum();
                sum / trees.len() as f64
            }
            ModelArtifact::Linear { coefficients, intercept } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(features.iter())
                        .map(|(c, x)| c * x)
                        .sum::<f64>()
            }
        };
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split { feature, threshold, left: 1, right: 2 },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_forest_averages_trees() {
        let model = ModelArtifact::RandomForest {
            n_features: 2,
            trees: vec![stump(0, 0.5, 1.0, 3.0), stump(1, 10.0, 2.0, 6.0)],
        };
        assert!(model.validate().is_ok());
        // tree 0 → 3.0 (0.9 > 0.5), tree 1 → 2.0 (4 <= 10)
        assert_eq!(model.predict(&[0.9, 4.0]).unwrap(), 2.5);
        // threshold is inclusive on the left
        assert_eq!(model.predict(&[0.5, 10.0]).unwrap(), 1.5);
    }

    #[test]
    fn test_linear_model() {
        let model = ModelArtifact::Linear {
            coefficients: vec![2.0, -1.0, 0.5, 0.0],
            intercept: 1.0,
        };
        assert_eq!(model.predict(&[1.0, 2.0, 4.0, 100.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_backward_child_is_rejected() {
        let model = ModelArtifact::RandomForest {
            n_features: 1,
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split { feature: 0, threshold: 0.0, left: 0, right: 1 },
                    TreeNode::Leaf { value: 1.0 },
                ],
            }],
        };
        let reason = model.validate().unwrap_err();
        assert!(reason.contains("invalid child index"), "{}", reason);
    }

    #[test]
    fn test_out_of_range_feature_is_rejected() {
        let model = ModelArtifact::RandomForest {
            n_features: 2,
            trees: vec![stump(3, 0.0, 0.0, 1.0)],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_predict_checks_width() {
        let model = ModelArtifact::Linear { coefficients: vec![1.0; 4], intercept: 0.0 };
        assert!(matches!(
            model.predict(&[1.0]),
            Err(PipelineError::FeatureWidth { expected: 4, actual: 1 })
        ));
    }

    #[test]
    fn test_forest_json_shape() {
        let json = r#"{
            "kind": "random_forest",
            "n_features": 1,
            "trees": [
                {"nodes": [
                    {"type": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 2},
                    {"type": "leaf", "value": 10.0},
                    {"type": "leaf", "value": 20.0}
                ]}
            ]
        }"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        assert!(model.validate().is_ok());
        assert_eq!(model.predict(&[0.7]).unwrap(), 20.0);
    }
}
