//! Shared building blocks for the herald mail gateway.
//!
//! This crate holds the pieces every other herald crate depends on:
//! address syntax validation, the SMTP configuration type, tracing
//! initialisation, and the process-wide shutdown [`Signal`].

pub mod address;
pub mod config;
pub mod logging;

pub use tracing;

/// Process-wide coordination signal, broadcast to long-running tasks.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}
