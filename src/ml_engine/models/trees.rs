//! Gradient-boosted trees evaluated from a node dump

use super::{sigmoid, Classifier};
use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Direction taken when the feature value is NaN
        #[serde(default)]
        missing_left: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk from the root to a leaf; rows go left when `x < threshold`
    pub fn leaf_value(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let mut index = 0;

        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { leaf }) => return Ok(*leaf),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    missing_left,
                }) => {
                    let x = *row.get(*feature).ok_or(InferenceError::FeatureIndex {
                        index: *feature,
                        width: row.len(),
                    })?;
                    let go_left = if x.is_nan() { *missing_left } else { x < *threshold };
                    index = if go_left { *left } else { *right };
                }
                None => {
                    return Err(InferenceError::Model(format!(
                        "tree node {} does not exist",
                        index
                    )))
                }
            }
        }

        Err(InferenceError::Model("tree contains a cycle".to_string()))
    }

    fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { leaf } if !leaf.is_finite() => {
                    return Err(format!("node {} has a non-finite leaf", i));
                }
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= width {
                        return Err(format!(
                            "node {} splits on feature {} but only {} features exist",
                            i, feature, width
                        ));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {} has a child out of range", i));
                    }
                }
                TreeNode::Leaf { .. } => {}
            }
        }

        Ok(())
    }
}

/// Boosted ensemble: `sigmoid(logit(base_score) + Σ leaves)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

fn default_base_score() -> f64 {
    0.5
}

impl GradientBoostedTrees {
    fn base_margin(&self) -> f64 {
        (self.base_score / (1.0 - self.base_score)).ln()
    }

    pub fn validate(&self, width: usize) -> Result<(), String> {
        if !(self.base_score > 0.0 && self.base_score < 1.0) {
            return Err(format!(
                "base_score {} must lie strictly between 0 and 1",
                self.base_score
            ));
        }
        if self.trees.is_empty() {
            return Err("gradient boosting model has no trees".to_string());
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(width)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }

        Ok(())
    }
}

impl Classifier for GradientBoostedTrees {
    fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let mut margin = self.base_margin();
        for tree in &self.trees {
            margin += tree.leaf_value(row)?;
        }
        Ok(sigmoid(margin))
    }

    fn kind(&self) -> &'static str {
        "gradient_boosting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                    missing_left: true,
                },
                TreeNode::Leaf { leaf: left },
                TreeNode::Leaf { leaf: right },
            ],
        }
    }

    #[test]
    fn test_stump_routing() {
        let tree = stump(0, 10.0, -1.0, 1.0);
        assert_eq!(tree.leaf_value(&[5.0]).unwrap(), -1.0);
        assert_eq!(tree.leaf_value(&[10.0]).unwrap(), 1.0);
        assert_eq!(tree.leaf_value(&[f64::NAN]).unwrap(), -1.0);
    }

    #[test]
    fn test_ensemble_probability() {
        let model = GradientBoostedTrees {
            base_score: 0.5,
            trees: vec![stump(0, 10.0, -0.5, 0.5), stump(1, 0.0, -0.25, 0.25)],
        };

        let p = model.positive_probability(&[20.0, 1.0]).unwrap();
        assert!((p - sigmoid(0.75)).abs() < 1e-12);

        let p = model.positive_probability(&[0.0, -1.0]).unwrap();
        assert!((p - sigmoid(-0.75)).abs() < 1e-12);
    }

    #[test]
    fn test_feature_out_of_range() {
        let model = GradientBoostedTrees {
            base_score: 0.5,
            trees: vec![stump(3, 0.0, 0.0, 0.0)],
        };
        assert_eq!(
            model.positive_probability(&[1.0]),
            Err(InferenceError::FeatureIndex { index: 3, width: 1 })
        );
        assert!(model.validate(1).is_err());
        assert!(model.validate(4).is_ok());
    }

    #[test]
    fn test_cycle_detected() {
        let tree = RegressionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
                missing_left: false,
            }],
        };
        assert!(matches!(tree.leaf_value(&[1.0]), Err(InferenceError::Model(_))));
    }

    #[test]
    fn test_node_dump_deserialization() {
        let json = r#"{
            "base_score": 0.5,
            "trees": [{"nodes": [
                {"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"leaf": -0.2},
                {"leaf": 0.4}
            ]}]
        }"#;
        let model: GradientBoostedTrees = serde_json::from_str(json).unwrap();

        assert!(model.validate(1).is_ok());
        assert_eq!(model.trees[0].leaf_value(&[2.0]).unwrap(), 0.4);
        assert_eq!(model.trees[0].leaf_value(&[f64::NAN]).unwrap(), 0.4);
    }

    #[test]
    fn test_invalid_base_score() {
        let model = GradientBoostedTrees {
            base_score: 1.0,
            trees: vec![stump(0, 0.0, 0.0, 0.0)],
        };
        assert!(model.validate(1).is_err());
    }
}
