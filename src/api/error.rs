//! API error mapping

use super::types::ErrorBody;
use crate::error::{ParseError, PredictionError};
use crate::parser::FeatureMap;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Field \"text\" with token data is required")]
    MissingText,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Failed to parse token data: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingText | ApiError::InvalidBody(_) | ApiError::Parse(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Prediction(PredictionError::ModelNotLoaded) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Prediction(PredictionError::Inference(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Log the failure and build the response; `verbose` adds the debug chain
    pub fn into_error_response(self, verbose: bool) -> ErrorResponse {
        let status = self.status();
        if status.is_server_error() {
            error!("API error ({}): {}", status.as_u16(), self);
        } else {
            warn!("Rejected request ({}): {}", status.as_u16(), self);
        }

        ErrorResponse {
            status,
            body: ErrorBody {
                error: self.to_string(),
                detail: verbose.then(|| format!("{:?}", self)),
                parsed_data: None,
            },
        }
    }
}

/// `{ "error": ... }` with the matching status code
#[derive(Debug)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ErrorResponse {
    /// Attach the features that were parsed before the failure
    pub fn with_parsed_data(mut self, features: FeatureMap) -> Self {
        self.body.parsed_data = Some(features);
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Turns a handler panic into a JSON 500 instead of dropping the connection
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Handler panicked: {}", message);

    ErrorResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorBody {
            error: "Internal server error".to_string(),
            detail: None,
            parsed_data: None,
        },
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingText.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Parse(ParseError::EmptyInput).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Prediction(PredictionError::ModelNotLoaded).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Prediction(InferenceError::NonFinite(f64::NAN).into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_detail_only_when_verbose() {
        let quiet = ApiError::MissingText.into_error_response(false);
        assert!(quiet.body.detail.is_none());

        let verbose = ApiError::MissingText.into_error_response(true);
        assert_eq!(verbose.body.detail.as_deref(), Some("MissingText"));
    }

    #[test]
    fn test_parsed_data_attached_on_request() {
        let response = ApiError::Prediction(PredictionError::ModelNotLoaded)
            .into_error_response(false)
            .with_parsed_data(FeatureMap::new());

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        let json = serde_json::to_value(&response.body).unwrap();
        assert_eq!(json["parsed_data"], serde_json::json!({}));

        let plain = ApiError::MissingText.into_error_response(false);
        let json = serde_json::to_value(&plain.body).unwrap();
        assert!(json.get("parsed_data").is_none());
    }
}
