//! SMTP configuration supplied per configure-request.
//!
//! A [`SmtpConfig`] must pass [`SmtpConfig::validate`] before a transport
//! may be constructed from it. The secret password field never appears in
//! the redacted echo returned to clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address;

/// Errors produced while validating an [`SmtpConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required configuration field is missing or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A configuration value is present but invalid.
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Declared SMTP server configuration.
///
/// `secure` selects implicit TLS on connect; when it is `false` the
/// transport still attempts an opportunistic STARTTLS upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    /// SMTP server hostname or address.
    pub host: String,

    /// SMTP server port (1-65535).
    pub port: u16,

    /// Account username. Doubles as the envelope sender address, so it
    /// must be a syntactically valid email address.
    pub user_name: String,

    /// Account password. Never echoed back to clients.
    pub password: String,

    /// Use implicit TLS (TLS-on-connect) instead of STARTTLS.
    pub secure: bool,

    /// Accept invalid or self-signed TLS certificates.
    ///
    /// Disabled by default; opting in weakens transport security and is
    /// only meant for servers with self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl SmtpConfig {
    /// Validate the configuration shape.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the host is empty, the port is 0,
    /// the username is not a valid address, or the password is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("host"));
        }

        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be between 1 and 65535".to_string(),
            });
        }

        if address::validate(&self.user_name).is_err() {
            return Err(ConfigError::Invalid {
                field: "userName",
                reason: format!("not a valid email address: {}", self.user_name),
            });
        }

        if self.password.is_empty() {
            return Err(ConfigError::MissingField("password"));
        }

        Ok(())
    }

    /// The non-secret subset of the configuration, suitable for echoing
    /// back to clients as confirmation.
    #[must_use]
    pub fn redacted(&self) -> RedactedSmtpConfig {
        RedactedSmtpConfig {
            host: self.host.clone(),
            port: self.port,
            user_name: self.user_name.clone(),
            secure: self.secure,
        }
    }
}

/// Non-secret view of an [`SmtpConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedactedSmtpConfig {
    pub host: String,
    pub port: u16,
    pub user_name: String,
    pub secure: bool,
}
