//! The dispatch session: one explicitly owned transport with an
//! open/replace/close lifecycle, plus the settle-all bulk fan-out.
//!
//! All per-recipient sends are issued concurrently and the orchestrator
//! waits for every one to reach a terminal state before reporting. A
//! single recipient's failure never aborts or negates the others; the
//! pool cap inside the transport is the only concurrency bound, and
//! sends beyond it queue implicitly there.

use std::sync::Arc;

use futures_util::future::join_all;
use herald_common::config::{RedactedSmtpConfig, SmtpConfig};
use tokio::sync::RwLock;

use crate::{
    error::DispatchError,
    message::{BulkSendRequest, SingleSendRequest},
    service::MailSender,
    transport::SmtpSender,
    types::{BulkReport, SendOutcome},
};

struct ActiveTransport {
    sender: Arc<dyn MailSender>,
    /// Account address used as the envelope sender.
    account: String,
}

/// Holds the process's active transport and orchestrates dispatch.
///
/// Configuration replaces the transport atomically under a write lock;
/// the previous transport is dropped on replacement, which closes its
/// pooled connections.
#[derive(Default)]
pub struct Dispatcher {
    active: RwLock<Option<ActiveTransport>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
        }
    }

    /// Validate `config`, build a transport, verify it with a handshake,
    /// and install it as the active transport, replacing any prior one.
    ///
    /// Returns the non-secret subset of the configuration as
    /// confirmation.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Configuration`] when validation fails,
    /// [`DispatchError::Authentication`] or
    /// [`DispatchError::Connection`] when verification fails.
    pub async fn configure(&self, config: SmtpConfig) -> Result<RedactedSmtpConfig, DispatchError> {
        config.validate()?;

        let sender = SmtpSender::from_config(&config)?;
        sender.verify().await?;

        tracing::info!(host = %config.host, port = config.port, "SMTP transport verified");
        self.install(Arc::new(sender), config.user_name.clone()).await;

        Ok(config.redacted())
    }

    /// Verify an ad-hoc configuration without persisting anything.
    ///
    /// # Errors
    ///
    /// Same as [`Dispatcher::configure`].
    pub async fn check(&self, config: SmtpConfig) -> Result<RedactedSmtpConfig, DispatchError> {
        config.validate()?;

        let sender = SmtpSender::from_config(&config)?;
        sender.verify().await?;

        Ok(config.redacted())
    }

    /// Install a sender as the active transport. The prior transport, if
    /// any, is dropped here, releasing its pooled connections.
    pub async fn install(&self, sender: Arc<dyn MailSender>, account: String) {
        let mut active = self.active.write().await;
        if active.is_some() {
            tracing::info!("replacing previously configured SMTP transport");
        }
        *active = Some(ActiveTransport { sender, account });
    }

    /// Drop the active transport, if any.
    pub async fn close(&self) {
        self.active.write().await.take();
    }

    /// Returns `true` when a transport is configured.
    pub async fn is_configured(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Fan a bulk request out to every recipient concurrently and wait
    /// for all terminal states.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotConfigured`] when no transport is active, or
    /// a request-level error from validation. Per-recipient delivery
    /// failures are folded into the report, never raised.
    pub async fn send_bulk(&self, request: BulkSendRequest) -> Result<BulkReport, DispatchError> {
        let (sender, account) = {
            let guard = self.active.read().await;
            let active = guard.as_ref().ok_or(DispatchError::NotConfigured)?;
            (Arc::clone(&active.sender), active.account.clone())
        };

        request.validate()?;
        let attachments = request.normalized_attachments()?;

        let sends = request.recipients.iter().map(|recipient| {
            let sender = Arc::clone(&sender);
            let account = account.clone();
            let request = &request;
            let attachments = &attachments;
            async move {
                let outcome = match request.build_message(&account, recipient, attachments) {
                    Ok(message) => SendOutcome::from(sender.send(message).await),
                    Err(error) => SendOutcome::Failed {
                        reason: error.to_string(),
                    },
                };
                (recipient.clone(), outcome)
            }
        });

        let outcomes = join_all(sends).await;
        let report = BulkReport::from_outcomes(outcomes);

        tracing::info!(
            success = report.success_count,
            failed = report.failed_count,
            "bulk dispatch settled"
        );

        Ok(report)
    }

    /// Send a single message through a per-request transport.
    ///
    /// The delivery runs as an explicitly spawned task; the returned
    /// handle may be awaited for the terminal [`SendOutcome`], or
    /// dropped for fire-and-forget semantics. Either way the outcome is
    /// logged when the task settles.
    ///
    /// # Errors
    ///
    /// Request-level errors only; delivery failure is reported through
    /// the task's outcome.
    pub fn send_single(
        &self,
        request: &SingleSendRequest,
    ) -> Result<tokio::task::JoinHandle<SendOutcome>, DispatchError> {
        request.validate()?;

        let server = request
            .server
            .as_ref()
            .ok_or_else(|| DispatchError::InvalidInput("server configuration is required".to_string()))?;
        server.validate()?;

        let sender = SmtpSender::from_config(server)?;
        let message = request.build_message(&server.user_name)?;
        let recipient = request.to.clone().unwrap_or_default();

        Ok(tokio::spawn(async move {
            let outcome = SendOutcome::from(sender.send(message).await);
            match &outcome {
                SendOutcome::Delivered => {
                    tracing::info!(%recipient, "single send delivered");
                }
                SendOutcome::Failed { reason } => {
                    tracing::warn!(%recipient, %reason, "single send failed");
                }
            }
            outcome
        }))
    }
}
