//! Classifiers loaded from the artifact bundle
//!
//! Two serialisable families are supported: plain logistic regression and
//! gradient-boosted decision trees (XGBoost-style node dump). Both are
//! evaluated directly on the assembled feature row.

mod trees;

pub use trees::{GradientBoostedTrees, RegressionTree, TreeNode};

use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

/// Binary classifier producing the positive-class probability
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError>;

    fn kind(&self) -> &'static str;
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression: `sigmoid(intercept + coefficients · x)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LogisticRegressionModel {
    fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError> {
        if row.len() != self.coefficients.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>();

        Ok(sigmoid(z))
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}

/// Classifier section of the artifact file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierModel {
    LogisticRegression(LogisticRegressionModel),
    GradientBoosting(GradientBoostedTrees),
}

impl ClassifierModel {
    /// Check the model against the number of input columns
    pub fn validate(&self, width: usize) -> Result<(), String> {
        match self {
            ClassifierModel::LogisticRegression(model) => {
                if model.coefficients.len() != width {
                    return Err(format!(
                        "logistic regression has {} coefficients for {} features",
                        model.coefficients.len(),
                        width
                    ));
                }
                if !model.intercept.is_finite() || model.coefficients.iter().any(|w| !w.is_finite()) {
                    return Err("logistic regression has non-finite weights".to_string());
                }
                Ok(())
            }
            ClassifierModel::GradientBoosting(model) => model.validate(width),
        }
    }
}

impl Classifier for ClassifierModel {
    fn positive_probability(&self, row: &[f64]) -> Result<f64, InferenceError> {
        match self {
            ClassifierModel::LogisticRegression(model) => model.positive_probability(row),
            ClassifierModel::GradientBoosting(model) => model.positive_probability(row),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::LogisticRegression(model) => model.kind(),
            ClassifierModel::GradientBoosting(model) => model.kind(),
        }
    }
}
