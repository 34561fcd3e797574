//! HTTP API surface for the herald mail gateway.
//!
//! Exposes four JSON endpoints over the dispatch layer:
//!
//! - **`POST /api/configure-smtp`** - verify credentials and install the
//!   process-wide transport
//! - **`POST /api/send-bulk-emails`** - settle-all bulk dispatch with a
//!   per-recipient report
//! - **`POST /api/check`** - verify an ad-hoc configuration, nothing
//!   persisted
//! - **`POST /api/send-email`** - single send with inline configuration
//!
//! Every route sits behind a fixed-window rate limiter, permissive CORS,
//! and a 50 MB body limit for inline attachments.

pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod server;

pub use config::{HttpConfig, RateLimitConfig};
pub use error::{ApiError, ServerError};
pub use rate_limit::RateLimiter;
pub use server::ApiServer;
