//! HTTP error responses.
//!
//! Every failure leaves the server as a JSON body with a machine-readable code
//! and a short message. Upstream causes are logged by the catalog, never returned.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gamevault_core::{CatalogError, LibraryError};
use serde::{Deserialize, Serialize};

/// Error categories returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed query string or body
    InvalidInput,
    /// Body parsed but broke a field rule
    ValidationFailed,
    /// Requested game does not exist
    GameNotFound,
    /// Catalog is empty or could not be loaded
    NoData,
    /// Unexpected failure inside the server
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::GameNotFound => StatusCode::NOT_FOUND,
            ErrorCode::NoData | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message used when no more specific one is given.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::GameNotFound => "Game not found",
            ErrorCode::NoData => "No games available",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Structured error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NoData => ApiError::from_code(ErrorCode::NoData),
            CatalogError::NotFound(_) => ApiError::from_code(ErrorCode::GameNotFound),
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Validation(validation) => {
                let details = serde_json::to_value(&validation.errors).unwrap_or_default();
                ApiError::from_code(ErrorCode::ValidationFailed).with_details(details)
            }
            LibraryError::Storage(cause) => {
                tracing::error!("user library failure: {cause:#}");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
