//! HTTP API
//!
//! - `GET  /health`  - service and model status
//! - `POST /predict` - parse a status message and score it
//! - `GET  /test`    - run the full pipeline on an embedded sample

mod error;
mod sample;
mod types;

pub use error::{panic_response, ApiError, ErrorResponse};
pub use sample::SAMPLE_TOKEN_TEXT;
pub use types::*;

use crate::error::PredictionError;
use crate::ml_engine::TokenPredictor;
use crate::parser::parse_token_data;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Shared, read-only state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: Arc<TokenPredictor>,
    pub environment: String,
    pub verbose_errors: bool,
}

impl AppState {
    pub fn new(predictor: TokenPredictor, environment: impl Into<String>, verbose_errors: bool) -> Self {
        Self {
            predictor: Arc::new(predictor),
            environment: environment.into(),
            verbose_errors,
        }
    }

    fn fail(&self, err: ApiError) -> ErrorResponse {
        err.into_error_response(self.verbose_errors)
    }

    /// Parse, predict, and optionally attach the parsed features.
    ///
    /// Without a model, requested features are returned alongside the 503.
    fn run_pipeline(
        &self,
        text: &str,
        include_parsed_data: bool,
    ) -> Result<PredictResponse, ErrorResponse> {
        let features = parse_token_data(text).map_err(|e| self.fail(e.into()))?;

        match self.predictor.predict(&features) {
            Ok(prediction) => Ok(PredictResponse {
                prediction,
                parsed_data: include_parsed_data.then_some(features),
            }),
            Err(PredictionError::ModelNotLoaded) if include_parsed_data => {
                Err(self.fail(PredictionError::ModelNotLoaded.into()).with_parsed_data(features))
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/test", get(self_test))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response)),
        );

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /health - never fails
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.predictor.artifacts().map(|artifacts| {
        let info = artifacts.info();
        ModelSummary {
            feature_count: artifacts.feature_names().len(),
            classifier: artifacts.classifier().kind(),
            artifact_version: info.and_then(|i| i.version.clone()),
            fingerprint: info.map(|i| i.fingerprint.clone()),
            loaded_at: info.map(|i| i.loaded_at),
        }
    });

    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.predictor.is_loaded(),
        version: API_VERSION,
        optimized_for: "new_data_format",
        drift_correction: "enabled",
        environment: state.environment.clone(),
        model,
    })
}

/// POST /predict - body `{ "text": ..., "include_parsed_data": bool }`
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ErrorResponse> {
    let request_id = Uuid::new_v4();

    let Json(request) = payload.map_err(|e| state.fail(ApiError::InvalidBody(e.body_text())))?;
    let text = request
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| state.fail(ApiError::MissingText))?;

    info!(%request_id, chars = text.len(), "📨 Predict request");

    let response = state.run_pipeline(&text, request.include_parsed_data)?;

    info!(
        %request_id,
        "✅ {:?} (p={:.4})",
        response.prediction.recommendation,
        response.prediction.probability
    );

    Ok(Json(response))
}

/// GET /test - full pipeline on the embedded sample, parsed data included
async fn self_test(
    State(state): State<AppState>,
) -> Result<Json<PredictResponse>, ErrorResponse> {
    state.run_pipeline(SAMPLE_TOKEN_TEXT, true).map(Json)
}
