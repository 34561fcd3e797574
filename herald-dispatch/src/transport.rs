//! SMTP transport factory.
//!
//! Builds a pooled lettre transport from a validated
//! [`SmtpConfig`]. Construction opens no connection; the pool dials
//! lazily on first use. Resource usage under bulk load is bounded by the
//! pool cap and a per-socket timeout.

use std::time::Duration;

use async_trait::async_trait;
use herald_common::config::SmtpConfig;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::{
        PoolConfig,
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use crate::{
    error::{DispatchError, SendFailure, classify_verify_error},
    service::MailSender,
};

/// Connection, greeting, and socket timeout applied to the transport.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pooled connections per transport.
const MAX_CONNECTIONS: u32 = 10;

/// A pooled lettre transport bound to one SMTP configuration.
///
/// Dropping the sender closes the pool and releases its connections.
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Build a transport from a validated configuration.
    ///
    /// `secure: true` selects implicit TLS on connect; otherwise the
    /// transport attempts an opportunistic STARTTLS upgrade. Certificate
    /// validation is relaxed only when `accept_invalid_certs` is set.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Internal`] when the TLS parameters cannot be
    /// constructed for the configured host.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, DispatchError> {
        let tls_parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| DispatchError::Internal(format!("TLS configuration failed: {e}")))?;

        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .credentials(Credentials::new(
                config.user_name.clone(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .pool_config(PoolConfig::new().max_size(MAX_CONNECTIONS))
            .tls(tls)
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl MailSender for SmtpSender {
    async fn verify(&self) -> Result<(), DispatchError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DispatchError::Connection(
                "server rejected the handshake".to_string(),
            )),
            Err(error) => {
                tracing::warn!(%error, "SMTP verification handshake failed");
                Err(classify_verify_error(&error))
            }
        }
    }

    async fn send(&self, message: Message) -> Result<(), SendFailure> {
        match self.transport.send(message).await {
            Ok(response) => {
                tracing::debug!(code = %response.code(), "message accepted by server");
                Ok(())
            }
            Err(error) => Err(SendFailure::new(error.to_string())),
        }
    }
}
