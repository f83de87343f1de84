//! ML Engine - model serving for token signals
//!
//! This module implements:
//! - Feature frame assembly (model column order)
//! - Missing-value imputation
//! - Classifiers (logistic regression, gradient-boosted trees)
//! - Artifact bundle loading
//! - Inference + decision layer (drift correction, thresholds)

pub mod features;
pub mod imputer;
pub mod models;
pub mod persistence;
pub mod predictor;

pub use features::FeatureFrame;
pub use imputer::{ImputeStrategy, SimpleImputer};
pub use models::{Classifier, ClassifierModel, GradientBoostedTrees, LogisticRegressionModel};
pub use persistence::{ArtifactFile, ArtifactInfo, ModelArtifacts};
pub use predictor::{
    ConfidenceLevel, ModelInfo, Recommendation, RiskLevel, TokenPrediction, TokenPredictor,
    Verdict,
};
