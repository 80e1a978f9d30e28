// Error types for gemextract
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid pricing: {0}")]
    InvalidPricing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Error type string used in the JSON error envelope
    pub fn error_type(&self) -> &'static str {
        match self {
            ExtractError::NotFound(_) => "not_found_error",
            ExtractError::InvalidRequest(_) | ExtractError::InvalidPricing(_) => {
                "invalid_request_error"
            }
            ExtractError::Config(_) | ExtractError::ConfigParsing(_) => "configuration_error",
            ExtractError::Extraction(_) => "extraction_error",
            _ => "api_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractError::NotFound(_) => StatusCode::NOT_FOUND,
            ExtractError::InvalidRequest(_) | ExtractError::InvalidPricing(_) => {
                StatusCode::BAD_REQUEST
            }
            ExtractError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ExtractError::Extraction(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert ExtractError to HTTP responses for Axum
impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "type": "error",
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
