//! Request handlers for the herald API.
//!
//! Handlers stay thin: shape the incoming JSON, call the dispatcher,
//! translate the result. All failure mapping lives in
//! [`ApiError`](crate::error::ApiError).

use std::sync::Arc;

use axum::{Json, extract::State};
use herald_common::config::{RedactedSmtpConfig, SmtpConfig};
use herald_dispatch::{
    BulkReport, DispatchError, Dispatcher,
    message::{AttachmentSpec, BulkSendRequest, SingleSendRequest},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// SMTP configuration as it arrives on the wire. Fields are optional so
/// missing ones produce a 400 with a useful message instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureRequest {
    pub host: Option<String>,
    pub port: Option<u32>,
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub secure: Option<bool>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl ConfigureRequest {
    fn into_config(self) -> Result<SmtpConfig, DispatchError> {
        let (Some(host), Some(port), Some(user_name), Some(password)) =
            (self.host, self.port, self.user_name, self.password)
        else {
            return Err(DispatchError::InvalidInput(
                "Missing required SMTP configuration fields: host, port, userName, and password are required"
                    .to_string(),
            ));
        };

        let port = u16::try_from(port).ok().filter(|p| *p > 0).ok_or_else(|| {
            DispatchError::InvalidInput(
                "Invalid port number: port must be between 1 and 65535".to_string(),
            )
        })?;

        Ok(SmtpConfig {
            host,
            port,
            user_name,
            password,
            secure: self.secure.unwrap_or(false),
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureResponse {
    pub message: &'static str,
    pub config: RedactedSmtpConfig,
}

/// `POST /api/configure-smtp` — verify the supplied configuration and
/// install it as the process-wide transport.
pub async fn configure_smtp(
    State(state): State<AppState>,
    Json(request): Json<ConfigureRequest>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    let config = request.into_config()?;
    let config = state.dispatcher.configure(config).await?;

    Ok(Json(ConfigureResponse {
        message: "SMTP configured successfully",
        config,
    }))
}

/// `POST /api/check` — verify an ad-hoc configuration without
/// persisting it.
pub async fn check_smtp(
    State(state): State<AppState>,
    Json(request): Json<ConfigureRequest>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    let config = request.into_config()?;
    let config = state.dispatcher.check(config).await?;

    Ok(Json(ConfigureResponse {
        message: "SMTP configuration verified",
        config,
    }))
}

/// `POST /api/send-bulk-emails` — settle-all fan-out to every
/// recipient.
///
/// Responds 200 with the report regardless of per-recipient outcomes;
/// only request-level failures produce an error status.
pub async fn send_bulk_emails(
    State(state): State<AppState>,
    Json(request): Json<BulkSendRequest>,
) -> Result<Json<BulkReport>, ApiError> {
    let report = state.dispatcher.send_bulk(request).await?;
    Ok(Json(report))
}

/// Single-send request with the server configuration inline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub name: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentSpec>,
    pub server: Option<ConfigureRequest>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: &'static str,
    pub success: bool,
}

/// `POST /api/send-email` — single send through a per-request
/// transport.
///
/// The delivery task is spawned and its handle dropped; the 200
/// response confirms acceptance, not delivery. The task logs its
/// outcome when it settles.
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let server = request
        .server
        .map(ConfigureRequest::into_config)
        .transpose()?;

    let request = SingleSendRequest {
        name: request.name,
        to: request.to,
        subject: request.subject,
        body: request.body,
        attachments: request.attachments,
        server,
    };

    drop(state.dispatcher.send_single(&request)?);

    Ok(Json(SendEmailResponse {
        message: "Email sent successfully",
        success: true,
    }))
}
