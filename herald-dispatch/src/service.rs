//! Sender trait abstraction for dispatch operations.
//!
//! The [`Dispatcher`](crate::Dispatcher) talks to the mail server through
//! this trait rather than a concrete transport, which keeps the bulk
//! orchestration testable against a deterministic mock and decouples it
//! from the lettre client.

use async_trait::async_trait;
use lettre::Message;

use crate::error::{DispatchError, SendFailure};

/// An established, reusable path to one mail server.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Perform a protocol handshake against the configured server.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Authentication`] when the server rejects the
    /// handshake, [`DispatchError::Connection`] when it cannot be
    /// reached.
    async fn verify(&self) -> Result<(), DispatchError>;

    /// Submit one message envelope for delivery.
    ///
    /// # Errors
    ///
    /// A [`SendFailure`] carrying the provider's rejection reason. The
    /// failure is scoped to this message only; it says nothing about
    /// other envelopes in flight on the same sender.
    async fn send(&self, message: Message) -> Result<(), SendFailure>;
}
