//! SMTP dispatch for the herald mail gateway.
//!
//! This crate owns everything between a validated HTTP request and the
//! configured mail server:
//!
//! - [`transport`]: builds pooled lettre transports from an
//!   [`SmtpConfig`](herald_common::config::SmtpConfig) and verifies them
//!   with a protocol handshake
//! - [`message`]: request types, attachment normalisation, and
//!   per-recipient envelope construction
//! - [`dispatcher`]: the [`Dispatcher`] session object holding the active
//!   transport, with the settle-all bulk fan-out
//! - [`types`]: per-recipient [`SendOutcome`] and the aggregated
//!   [`BulkReport`]
//!
//! Dispatch-level partial failure is not an error: a bulk send resolves
//! to a report describing every recipient's terminal state.

pub mod dispatcher;
pub mod error;
pub mod message;
pub mod service;
pub mod transport;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, SendFailure};
pub use message::{AttachmentSpec, BulkSendRequest, SingleSendRequest};
pub use service::MailSender;
pub use transport::SmtpSender;
pub use types::{BulkReport, SendOutcome};
