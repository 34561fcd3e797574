//! Typed error handling for dispatch operations.
//!
//! The taxonomy distinguishes request-level failures (invalid input,
//! recipient validation, missing configuration) from transport-level
//! failures (authentication, connection). Transport failures during a
//! bulk fan-out are never raised through this type; they are folded into
//! the report as per-recipient [`SendFailure`]s instead.

use herald_common::{address::AddressError, config::ConfigError};
use thiserror::Error;

/// Top-level dispatch error type.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or missing request fields.
    #[error("{0}")]
    InvalidInput(String),

    /// An address in the recipient, cc, or bcc lists failed the
    /// syntactic pattern.
    #[error("{0}")]
    Validation(#[from] AddressError),

    /// The supplied SMTP configuration failed validation.
    #[error("{0}")]
    Configuration(#[from] ConfigError),

    /// No transport has been configured for this session.
    #[error("SMTP not configured")]
    NotConfigured,

    /// The server rejected the handshake, most often bad credentials.
    #[error("SMTP verification failed: {0}")]
    Authentication(String),

    /// The server could not be reached at all.
    #[error("Failed to connect to SMTP server: {0}")]
    Connection(String),

    /// Unclassified internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Returns `true` if the error is the caller's fault (a 4xx-class
    /// request problem rather than a transport or internal one).
    #[must_use]
    pub const fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::Validation(_)
                | Self::Configuration(_)
                | Self::NotConfigured
        )
    }
}

/// A single recipient's delivery failure, carrying the provider's
/// structured rejection reason when one is available.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct SendFailure {
    pub detail: String,
}

impl SendFailure {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Categorize a lettre transport error observed during the verification
/// handshake.
///
/// A definitive server response (permanent or transient SMTP code) at
/// this stage almost always means rejected credentials or policy, so it
/// maps to [`DispatchError::Authentication`]. Everything else, timeouts
/// included, is a connection-level failure. The raw library error is
/// carried only as the categorized detail string.
#[must_use]
pub fn classify_verify_error(error: &lettre::transport::smtp::Error) -> DispatchError {
    if error.is_permanent() || error.is_transient() {
        DispatchError::Authentication(error.to_string())
    } else if error.is_timeout() {
        DispatchError::Connection(format!("timed out: {error}"))
    } else {
        DispatchError::Connection(error.to_string())
    }
}
