//! Fixed-window request-rate limiting, keyed by client IP.
//!
//! Each client gets a counter that resets when its window expires. The
//! table is a `DashMap` so concurrent requests from different clients
//! never contend on a single lock. Entries for idle clients are purged
//! periodically by the server.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window rate limiter.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            clients: DashMap::new(),
        }
    }

    /// Record a request from `client` and return `true` if it is within
    /// the limit for the current window.
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        let now = Instant::now();
        let mut entry = self.clients.entry(client).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Drop windows that expired before `now`. Called periodically so
    /// the table does not grow with every client ever seen.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.clients
            .retain(|_, window| now.duration_since(window.started_at) < self.window);
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

/// Middleware applying the limiter to every request.
///
/// The client key is the peer address when connection info is available,
/// otherwise a shared unspecified-address bucket.
pub async fn limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip());

    if limiter.try_acquire(client) {
        next.run(request).await
    } else {
        tracing::warn!(%client, "request rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "message": "Too many requests, please try again later",
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max_requests: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max_requests,
        })
    }

    fn client(last_octet: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet))
    }

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = limiter(60_000, 3);
        let ip = client(1);

        assert!(limiter.try_acquire(ip));
        assert!(limiter.try_acquire(ip));
        assert!(limiter.try_acquire(ip));
        assert!(!limiter.try_acquire(ip));
    }

    #[test]
    fn clients_are_tracked_independently() {
        let limiter = limiter(60_000, 1);

        assert!(limiter.try_acquire(client(1)));
        assert!(limiter.try_acquire(client(2)));
        assert!(!limiter.try_acquire(client(1)));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = limiter(0, 1);
        let ip = client(1);

        // A zero-length window expires immediately, so every request
        // starts a fresh window.
        assert!(limiter.try_acquire(ip));
        assert!(limiter.try_acquire(ip));
    }

    #[test]
    fn purge_drops_expired_windows() {
        let limiter = limiter(0, 1);
        assert!(limiter.try_acquire(client(1)));
        assert!(limiter.try_acquire(client(2)));

        limiter.purge_expired();
        assert!(limiter.clients.is_empty());
    }
}
