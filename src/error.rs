//! Error types for the token signal service

use thiserror::Error;

/// Failures while turning a status message into features
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Token text is empty")]
    EmptyInput,

    #[error("Invalid number for {field}: {raw:?}")]
    InvalidNumber { field: &'static str, raw: String },
}

/// Failures while reading the model artifact bundle
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode artifact {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact: {0}")]
    Validation(String),
}

/// Failures while running the imputer or the classifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Shape mismatch: expected {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Feature index {index} out of range for {width} columns")]
    FeatureIndex { index: usize, width: usize },

    #[error("Model produced a non-finite or out-of-range probability: {0}")]
    NonFinite(f64),

    #[error("Model error: {0}")]
    Model(String),
}

/// Failures of the inference + decision layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Prediction failed: {0}")]
    Inference(#[from] InferenceError),
}
