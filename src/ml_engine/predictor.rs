//! Token Predictor - inference + decision layer
//!
//! 1. Align features to the model columns ([`FeatureFrame`])
//! 2. Impute missing cells
//! 3. Positive-class probability from the classifier
//! 4. Drift correction (`1 - p`)
//! 5. Verdict, confidence and recommendation from fixed thresholds

use crate::error::{InferenceError, PredictionError};
use crate::ml_engine::features::FeatureFrame;
use crate::ml_engine::persistence::ModelArtifacts;
use crate::parser::FeatureMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Probability at or above which the verdict is positive
pub const DECISION_THRESHOLD: f64 = 0.5;
/// Threshold policies reported alongside the verdict
pub const CONSERVATIVE_THRESHOLD: f64 = 0.7;
pub const OPTIMAL_THRESHOLD: f64 = 0.5;
pub const AGGRESSIVE_THRESHOLD: f64 = 0.3;

/// Tag reported in `model_info.data_format`
pub const DATA_FORMAT: &str = "new_format_optimized";

/// Drift correction for the deployed model.
///
/// The classifier's scores are inverted relative to the live message format:
/// the served probability is `1 - raw`. Applied to every prediction.
pub fn correct_for_drift(raw_probability: f64) -> f64 {
    1.0 - raw_probability
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    #[serde(rename = "very high")]
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Label for a confidence score in `[0, 1]`
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            ConfidenceLevel::VeryHigh
        } else if score > 0.6 {
            ConfidenceLevel::High
        } else if score > 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Investigate,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl Recommendation {
    pub fn from_probability(probability: f64) -> (Self, RiskLevel) {
        if probability >= CONSERVATIVE_THRESHOLD {
            (Recommendation::Buy, RiskLevel::Low)
        } else if probability >= OPTIMAL_THRESHOLD {
            (Recommendation::Investigate, RiskLevel::Medium)
        } else {
            (Recommendation::Skip, RiskLevel::High)
        }
    }
}

/// Raw vs. corrected probability, for debugging the drift correction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub raw_probability: f64,
    pub corrected_probability: f64,
    pub drift_correction: bool,
    pub data_format: &'static str,
}

/// Decision record returned for one token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPrediction {
    pub prediction: Verdict,
    pub probability: f64,
    pub probability_percent: String,
    pub confidence_level: ConfidenceLevel,
    pub confidence_score: f64,
    pub recommendation: Recommendation,
    pub risk_level: RiskLevel,
    pub threshold_conservative: bool,
    pub threshold_optimal: bool,
    pub threshold_aggressive: bool,
    pub model_info: ModelInfo,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl TokenPrediction {
    /// Apply drift correction and thresholds to a raw classifier output
    pub fn from_raw_probability(raw_probability: f64) -> Result<Self, InferenceError> {
        if !raw_probability.is_finite() || !(0.0..=1.0).contains(&raw_probability) {
            return Err(InferenceError::NonFinite(raw_probability));
        }

        let probability = correct_for_drift(raw_probability);
        let confidence_score = (probability - 0.5).abs() * 2.0;
        let (recommendation, risk_level) = Recommendation::from_probability(probability);

        Ok(Self {
            prediction: if probability >= DECISION_THRESHOLD {
                Verdict::Yes
            } else {
                Verdict::No
            },
            probability: round4(probability),
            probability_percent: format!("{:.1}%", probability * 100.0),
            confidence_level: ConfidenceLevel::from_score(confidence_score),
            confidence_score: round4(confidence_score),
            recommendation,
            risk_level,
            threshold_conservative: probability >= CONSERVATIVE_THRESHOLD,
            threshold_optimal: probability >= OPTIMAL_THRESHOLD,
            threshold_aggressive: probability >= AGGRESSIVE_THRESHOLD,
            model_info: ModelInfo {
                raw_probability: round4(raw_probability),
                corrected_probability: round4(probability),
                drift_correction: true,
                data_format: DATA_FORMAT,
            },
        })
    }
}

/// Runs parsed features through the loaded model bundle
#[derive(Debug, Clone, Default)]
pub struct TokenPredictor {
    artifacts: Option<Arc<ModelArtifacts>>,
}

impl TokenPredictor {
    pub fn new(artifacts: Option<Arc<ModelArtifacts>>) -> Self {
        Self { artifacts }
    }

    pub fn with_artifacts(artifacts: ModelArtifacts) -> Self {
        Self::new(Some(Arc::new(artifacts)))
    }

    /// Predictor with no model; every prediction reports `ModelNotLoaded`
    pub fn unloaded() -> Self {
        Self::new(None)
    }

    pub fn is_loaded(&self) -> bool {
        self.artifacts.is_some()
    }

    pub fn artifacts(&self) -> Option<&ModelArtifacts> {
        self.artifacts.as_deref()
    }

    pub fn predict(&self, features: &FeatureMap) -> Result<TokenPrediction, PredictionError> {
        let artifacts = self
            .artifacts
            .as_ref()
            .ok_or(PredictionError::ModelNotLoaded)?;

        let mut frame = FeatureFrame::assemble(features, artifacts.feature_names());
        let imputed = artifacts.imputer().transform(frame.values_mut())?;
        if imputed > 0 {
            debug!("Imputed {} missing feature cells", imputed);
        }

        let row = frame.row().to_vec();
        let raw_probability = artifacts.classifier().positive_probability(&row)?;
        let prediction = TokenPrediction::from_raw_probability(raw_probability)?;

        info!(
            "🎯 Prediction: raw={:.4} corrected={:.4} -> {:?}",
            raw_probability, prediction.probability, prediction.recommendation
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml_engine::imputer::SimpleImputer;
    use crate::ml_engine::models::MockClassifier;
    use crate::parser::FeatureValue;

    fn predictor_with(mock: MockClassifier, names: &[&str]) -> TokenPredictor {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let imputer = SimpleImputer::zeros(names.len());
        TokenPredictor::with_artifacts(ModelArtifacts::new(names, imputer, Arc::new(mock)))
    }

    #[test]
    fn test_drift_correction_inverts() {
        for raw in [0.0, 0.1, 0.3, 0.5, 0.77, 1.0] {
            let p = TokenPrediction::from_raw_probability(raw).unwrap();
            assert_eq!(p.model_info.corrected_probability, round4(1.0 - raw));
            assert_eq!(p.model_info.raw_probability, round4(raw));
            assert!(p.model_info.drift_correction);
        }
    }

    #[test]
    fn test_recommendation_thresholds() {
        let rec = |raw: f64| TokenPrediction::from_raw_probability(raw).unwrap();

        let buy = rec(0.2);
        assert_eq!(buy.recommendation, Recommendation::Buy);
        assert_eq!(buy.risk_level, RiskLevel::Low);
        assert_eq!(buy.prediction, Verdict::Yes);

        let investigate = rec(0.4);
        assert_eq!(investigate.recommendation, Recommendation::Investigate);
        assert_eq!(investigate.risk_level, RiskLevel::Medium);
        assert_eq!(investigate.prediction, Verdict::Yes);

        let skip = rec(0.6);
        assert_eq!(skip.recommendation, Recommendation::Skip);
        assert_eq!(skip.risk_level, RiskLevel::High);
        assert_eq!(skip.prediction, Verdict::No);
    }

    #[test]
    fn test_threshold_flags() {
        let p = TokenPrediction::from_raw_probability(0.6).unwrap();
        assert!(!p.threshold_conservative);
        assert!(!p.threshold_optimal);
        assert!(p.threshold_aggressive);

        let p = TokenPrediction::from_raw_probability(0.9).unwrap();
        assert!(!p.threshold_aggressive);

        let p = TokenPrediction::from_raw_probability(0.0).unwrap();
        assert!(p.threshold_conservative && p.threshold_optimal && p.threshold_aggressive);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_score(0.95), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(0.7), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.4), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.0), ConfidenceLevel::Low);

        let p = TokenPrediction::from_raw_probability(0.05).unwrap();
        assert_eq!(p.confidence_level, ConfidenceLevel::VeryHigh);
        assert_eq!(p.confidence_score, 0.9);
    }

    #[test]
    fn test_rejects_invalid_probability() {
        assert!(TokenPrediction::from_raw_probability(f64::NAN).is_err());
        assert!(TokenPrediction::from_raw_probability(1.5).is_err());
        assert!(TokenPrediction::from_raw_probability(-0.1).is_err());
    }

    #[test]
    fn test_serialized_labels() {
        let json = serde_json::to_value(TokenPrediction::from_raw_probability(0.3).unwrap()).unwrap();
        assert_eq!(json["prediction"], "YES");
        assert_eq!(json["recommendation"], "BUY");
        assert_eq!(json["risk_level"], "LOW");
        assert_eq!(json["probability"], 0.7);
        assert_eq!(json["probability_percent"], "70.0%");
        assert_eq!(json["model_info"]["data_format"], DATA_FORMAT);

        let json = serde_json::to_value(TokenPrediction::from_raw_probability(0.05).unwrap()).unwrap();
        assert_eq!(json["confidence_level"], "very high");
    }

    #[test]
    fn test_model_not_loaded() {
        let predictor = TokenPredictor::unloaded();
        assert!(!predictor.is_loaded());
        assert_eq!(
            predictor.predict(&FeatureMap::new()),
            Err(PredictionError::ModelNotLoaded)
        );
    }

    #[test]
    fn test_classifier_receives_aligned_row() {
        let mut mock = MockClassifier::new();
        mock.expect_positive_probability()
            .withf(|row| row.to_vec() == vec![42_400.0, 0.0, 136_800.0])
            .times(1)
            .returning(|_| Ok(0.3));

        let predictor = predictor_with(mock, &["liquidity", "absent", "market_cap"]);

        let mut features = FeatureMap::new();
        features.insert("market_cap", FeatureValue::Float(136_800.0));
        features.insert("liquidity", FeatureValue::Float(42_400.0));

        let prediction = predictor.predict(&features).unwrap();
        assert_eq!(prediction.probability, 0.7);
        assert_eq!(prediction.recommendation, Recommendation::Buy);
    }

    #[test]
    fn test_classifier_error_is_reported() {
        let mut mock = MockClassifier::new();
        mock.expect_positive_probability()
            .returning(|_| Err(InferenceError::Model("boom".to_string())));

        let predictor = predictor_with(mock, &["market_cap"]);
        let err = predictor.predict(&FeatureMap::new()).unwrap_err();

        assert_eq!(
            err,
            PredictionError::Inference(InferenceError::Model("boom".to_string()))
        );
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_out_of_range_output_is_an_error() {
        let mut mock = MockClassifier::new();
        mock.expect_positive_probability().returning(|_| Ok(2.0));

        let predictor = predictor_with(mock, &["market_cap"]);
        assert_eq!(
            predictor.predict(&FeatureMap::new()),
            Err(PredictionError::Inference(InferenceError::NonFinite(2.0)))
        );
    }
}
