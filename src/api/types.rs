//! Request and response types for the HTTP API

use crate::ml_engine::TokenPrediction;
use crate::parser::FeatureMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version reported by `/health`
pub const API_VERSION: &str = "2.1";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub include_parsed_data: bool,
}

/// Decision record, optionally followed by the parsed features
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub prediction: TokenPrediction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<FeatureMap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub version: &'static str,
    pub optimized_for: &'static str,
    pub drift_correction: &'static str,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub feature_count: usize,
    pub classifier: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Parsed features, kept when only the prediction step failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<FeatureMap>,
}
