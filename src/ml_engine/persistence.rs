//! Model artifact persistence
//!
//! Reads the artifact bundle (feature list, fitted imputer, fitted classifier)
//! produced by the training pipeline. The bundle is loaded once at startup and
//! shared read-only afterwards.

use crate::error::ArtifactError;
use crate::ml_engine::imputer::SimpleImputer;
use crate::ml_engine::models::{Classifier, ClassifierModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// On-disk layout of the artifact bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    #[serde(default)]
    pub version: Option<String>,
    pub feature_names: Vec<String>,
    pub imputer: SimpleImputer,
    pub model: ClassifierModel,
}

impl ArtifactFile {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.feature_names.is_empty() {
            return Err(ArtifactError::Validation(
                "feature_names is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.feature_names {
            if !seen.insert(name.as_str()) {
                return Err(ArtifactError::Validation(format!(
                    "duplicate feature name {:?}",
                    name
                )));
            }
        }

        if self.imputer.width() != self.feature_names.len() {
            return Err(ArtifactError::Validation(format!(
                "imputer has {} statistics for {} features",
                self.imputer.width(),
                self.feature_names.len()
            )));
        }

        self.model
            .validate(self.feature_names.len())
            .map_err(ArtifactError::Validation)
    }
}

/// Provenance of a loaded bundle, reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub version: Option<String>,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub source: String,
}

/// Immutable model bundle shared by all requests
pub struct ModelArtifacts {
    feature_names: Vec<String>,
    imputer: SimpleImputer,
    classifier: Arc<dyn Classifier>,
    info: Option<ArtifactInfo>,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("features", &self.feature_names.len())
            .field("classifier", &self.classifier.kind())
            .field("info", &self.info)
            .finish()
    }
}

impl ModelArtifacts {
    /// Build a bundle in memory, e.g. around a stub classifier
    pub fn new(
        feature_names: Vec<String>,
        imputer: SimpleImputer,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            feature_names,
            imputer,
            classifier,
            info: None,
        }
    }

    /// Load and validate the bundle at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let bytes = fs::read(path).map_err(|e| ArtifactError::Io {
            path: source.clone(),
            source: e,
        })?;

        let file: ArtifactFile = serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Json {
            path: source.clone(),
            source: e,
        })?;
        file.validate()?;

        let info = ArtifactInfo {
            version: file.version.clone(),
            fingerprint: fingerprint(&bytes),
            loaded_at: Utc::now(),
            source,
        };

        info!(
            "📂 Model artifacts loaded from {} ({} features, {}, sha256 {})",
            info.source,
            file.feature_names.len(),
            file.model.kind(),
            &info.fingerprint[..12]
        );

        Ok(Self {
            feature_names: file.feature_names,
            imputer: file.imputer,
            classifier: Arc::new(file.model),
            info: Some(info),
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn imputer(&self) -> &SimpleImputer {
        &self.imputer
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn info(&self) -> Option<&ArtifactInfo> {
        self.info.as_ref()
    }
}

/// SHA-256 of the artifact bytes, hex encoded
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUNDLE: &str = r#"{
        "version": "2.1",
        "feature_names": ["market_cap", "liquidity"],
        "imputer": {"strategy": "median", "statistics": [0.0, 0.0]},
        "model": {"type": "logistic_regression", "coefficients": [0.0, 0.0], "intercept": 0.0}
    }"#;

    fn write_bundle(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_bundle() {
        let file = write_bundle(BUNDLE);
        let artifacts = ModelArtifacts::load(file.path()).unwrap();

        assert_eq!(artifacts.feature_names(), &["market_cap", "liquidity"]);
        assert_eq!(artifacts.classifier().kind(), "logistic_regression");

        let info = artifacts.info().unwrap();
        assert_eq!(info.version.as_deref(), Some("2.1"));
        assert_eq!(info.fingerprint, fingerprint(BUNDLE.as_bytes()));
        assert_eq!(info.fingerprint.len(), 64);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifacts::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_bundle("{ not json");
        let err = ModelArtifacts::load(file.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }

    #[test]
    fn test_imputer_width_mismatch() {
        let file = write_bundle(&BUNDLE.replace("[0.0, 0.0]}", "[0.0]}"));
        let err = ModelArtifacts::load(file.path()).unwrap_err();
        assert!(matches!(err, ArtifactError::Validation(_)));
    }

    #[test]
    fn test_duplicate_feature_names() {
        let file = write_bundle(&BUNDLE.replace("\"liquidity\"]", "\"market_cap\"]"));
        let err = ModelArtifacts::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
