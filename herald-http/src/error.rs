//! Centralized translation of dispatch failures into HTTP responses.
//!
//! This is the single place where the error taxonomy meets status codes
//! and response bodies. No retries happen here; the caller owns retry
//! policy.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use herald_dispatch::DispatchError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running the API server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("Failed to bind API server to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// The server encountered a runtime error.
    #[error("API server error: {0}")]
    Serve(String),
}

/// API-level error wrapping the dispatch taxonomy.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] DispatchError);

/// JSON error body. Absent fields are omitted from the serialized
/// output.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            error: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DispatchError::InvalidInput(_)
            | DispatchError::Validation(_)
            | DispatchError::Configuration(_)
            | DispatchError::NotConfigured => StatusCode::BAD_REQUEST,
            DispatchError::Authentication(_) => StatusCode::UNAUTHORIZED,
            DispatchError::Connection(_) | DispatchError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        match &self.0 {
            DispatchError::InvalidInput(message) => ErrorBody::message(message.clone()),
            DispatchError::Validation(error) => {
                ErrorBody::message("Recipient validation failed").with_details(error.to_string())
            }
            DispatchError::Configuration(error) => {
                ErrorBody::message("Invalid SMTP configuration").with_details(error.to_string())
            }
            DispatchError::NotConfigured => ErrorBody::message("SMTP not configured")
                .with_details("Use /api/configure-smtp first"),
            DispatchError::Authentication(detail) => ErrorBody::message("SMTP verification failed")
                .with_error(detail.clone())
                .with_details("Please check your SMTP credentials and server settings"),
            DispatchError::Connection(_) => ErrorBody::message("Failed to configure SMTP")
                .with_error("Failed to connect to SMTP server. Verify host and port."),
            DispatchError::Internal(message) => ErrorBody::message("Internal server error")
                .with_error(message.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
