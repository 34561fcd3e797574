//! The herald API server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};
use herald_common::Signal;
use herald_dispatch::Dispatcher;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::{
    config::HttpConfig,
    error::ServerError,
    handlers::{self, AppState},
    rate_limit::{self, RateLimiter},
};

/// HTTP API server bound to a listening socket.
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
    limiter: Arc<RateLimiter>,
}

impl ApiServer {
    /// Bind the server and assemble its router.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the configured address fails.
    pub async fn bind(config: &HttpConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|e| ServerError::Bind {
                address: config.listen_address.clone(),
                source: e,
            })?;

        tracing::info!(address = %config.listen_address, "API server bound");

        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let router = router(dispatcher, Arc::clone(&limiter), config)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

        Ok(Self {
            listener,
            router,
            limiter,
        })
    }

    /// The locally bound address, useful when binding to port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the server until a shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), ServerError> {
        // Periodically drop expired rate-limit windows.
        let limiter = Arc::clone(&self.limiter);
        let purge_every = limiter.window().max(Duration::from_secs(60));
        let purge = tokio::spawn(async move {
            let mut interval = tokio::time::interval(purge_every);
            loop {
                interval.tick().await;
                limiter.purge_expired();
            }
        });

        let result = axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("API server received shutdown signal");
        })
        .await
        .map_err(|e| ServerError::Serve(e.to_string()));

        purge.abort();
        tracing::info!("API server stopped");
        result
    }
}

/// Assemble the API router.
///
/// Split out of [`ApiServer`] so tests can drive it directly with
/// `tower::ServiceExt::oneshot`.
pub fn router(dispatcher: Arc<Dispatcher>, limiter: Arc<RateLimiter>, config: &HttpConfig) -> Router {
    let state = AppState { dispatcher };

    Router::new()
        .route("/api/configure-smtp", post(handlers::configure_smtp))
        .route("/api/send-bulk-emails", post(handlers::send_bulk_emails))
        .route("/api/check", post(handlers::check_smtp))
        .route("/api/send-email", post(handlers::send_email))
        .layer(middleware::from_fn_with_state(limiter, rate_limit::limit))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use herald_dispatch::{DispatchError, MailSender, SendFailure};
    use http_body_util::BodyExt;
    use lettre::Message;
    use tower::ServiceExt;

    use super::*;
    use crate::config::RateLimitConfig;

    /// Deterministic sender failing envelopes addressed to the deny set.
    struct MockSender {
        deny: HashSet<String>,
    }

    #[async_trait]
    impl MailSender for MockSender {
        async fn verify(&self) -> Result<(), DispatchError> {
            Ok(())
        }

        async fn send(&self, message: Message) -> Result<(), SendFailure> {
            let denied = message
                .envelope()
                .to()
                .iter()
                .any(|to| self.deny.contains(&to.to_string()));
            if denied {
                Err(SendFailure::new("550 mailbox unavailable"))
            } else {
                Ok(())
            }
        }
    }

    async fn test_router(deny: &[&str], configured: bool) -> Router {
        let dispatcher = Arc::new(Dispatcher::new());
        if configured {
            let sender = Arc::new(MockSender {
                deny: deny.iter().map(ToString::to_string).collect(),
            });
            dispatcher.install(sender, "account@example.com".to_string()).await;
        }

        let config = HttpConfig::default();
        router(
            dispatcher,
            Arc::new(RateLimiter::new(&config.rate_limit)),
            &config,
        )
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bulk_send_before_configure_is_rejected() {
        let router = test_router(&[], false).await;
        let request = post_json(
            "/api/send-bulk-emails",
            &serde_json::json!({
                "recipients": ["a@b.com"],
                "subject": "Hi",
                "textBody": "Hello",
            }),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "SMTP not configured");
    }

    #[tokio::test]
    async fn malformed_recipient_fails_validation_without_dispatch() {
        let router = test_router(&[], true).await;
        let request = post_json(
            "/api/send-bulk-emails",
            &serde_json::json!({
                "recipients": ["a@b.com", "bad-address"],
                "subject": "Hi",
                "textBody": "Hello",
            }),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["details"].as_str().unwrap().contains("bad-address"));
    }

    #[tokio::test]
    async fn partial_failure_still_responds_ok_with_a_report() {
        let router = test_router(&["ok2@b.com"], true).await;
        let request = post_json(
            "/api/send-bulk-emails",
            &serde_json::json!({
                "recipients": ["ok1@b.com", "ok2@b.com"],
                "subject": "Hi",
                "textBody": "Hello",
            }),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["successCount"], 1);
        assert_eq!(body["failedCount"], 1);
        assert_eq!(body["successfulRecipients"], serde_json::json!(["ok1@b.com"]));
        assert_eq!(body["failedRecipients"], serde_json::json!(["ok2@b.com"]));
        assert_eq!(body["message"], "Some emails were sent successfully");
    }

    #[tokio::test]
    async fn missing_subject_is_invalid_input() {
        let router = test_router(&[], true).await;
        let request = post_json(
            "/api/send-bulk-emails",
            &serde_json::json!({
                "recipients": ["a@b.com"],
                "textBody": "Hello",
            }),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn configure_with_missing_fields_is_bad_request() {
        let router = test_router(&[], false).await;
        let request = post_json(
            "/api/configure-smtp",
            &serde_json::json!({ "host": "smtp.example.com" }),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rate_limit_rejects_after_max_requests() {
        let dispatcher = Arc::new(Dispatcher::new());
        let config = HttpConfig::default();
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig {
            window_ms: 60_000,
            max_requests: 2,
        }));
        let router = router(dispatcher, limiter, &config);

        for expected in [
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            let request = post_json("/api/send-bulk-emails", &serde_json::json!({}));
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected);
        }
    }
}
