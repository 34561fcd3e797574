//! Request types and message envelope construction.
//!
//! A bulk request is validated once, its attachments are normalised
//! once, and then one envelope per recipient is built from the shared
//! parts. Attachment content may arrive as a raw byte array, a
//! serialized Node-style buffer, or a (possibly base64-encoded) string;
//! all three are normalised to raw bytes before dispatch.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use herald_common::{address, config::SmtpConfig};
use lettre::{
    Message,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
};
use serde::Deserialize;

use crate::error::DispatchError;

/// A bulk send request: shared subject, body, and attachments fanned out
/// to every recipient individually.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSendRequest {
    /// Optional display name for the `From` header. The address itself
    /// is always the configured account.
    pub sender_display_name: Option<String>,

    #[serde(default)]
    pub recipients: Vec<String>,

    pub subject: Option<String>,

    pub text_body: Option<String>,

    pub html_body: Option<String>,

    #[serde(default)]
    pub cc: Vec<String>,

    #[serde(default)]
    pub bcc: Vec<String>,

    #[serde(default)]
    pub attachments: Vec<AttachmentSpec>,

    /// Caller-supplied metadata. Accepted and ignored.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl BulkSendRequest {
    /// Check the request preconditions, in order, first failure wins:
    /// non-empty recipients, subject present, at least one body, then
    /// address validation over recipients, cc, and bcc.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidInput`] for shape problems,
    /// [`DispatchError::Validation`] for address syntax.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.recipients.is_empty() {
            return Err(DispatchError::InvalidInput(
                "recipients list must not be empty".to_string(),
            ));
        }

        if self.subject.as_ref().is_none_or(|s| s.is_empty()) {
            return Err(DispatchError::InvalidInput(
                "subject is required".to_string(),
            ));
        }

        if self.text_body.is_none() && self.html_body.is_none() {
            return Err(DispatchError::InvalidInput(
                "at least one of textBody or htmlBody is required".to_string(),
            ));
        }

        address::validate_list(&self.recipients)?;

        if !self.cc.is_empty() {
            address::validate_list(&self.cc)?;
        }

        if !self.bcc.is_empty() {
            address::validate_list(&self.bcc)?;
        }

        Ok(())
    }

    /// Normalise every attachment to raw bytes.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidInput`] when a payload claims base64
    /// encoding but does not decode, or carries an unparseable content
    /// type.
    pub fn normalized_attachments(&self) -> Result<Vec<NormalizedAttachment>, DispatchError> {
        self.attachments.iter().map(AttachmentSpec::normalize).collect()
    }

    /// Build the envelope for one recipient.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Internal`] when the pre-validated addresses or
    /// parts are rejected by the message builder.
    pub fn build_message(
        &self,
        account: &str,
        recipient: &str,
        attachments: &[NormalizedAttachment],
    ) -> Result<Message, DispatchError> {
        let mut builder = Message::builder()
            .from(sender_mailbox(self.sender_display_name.as_deref(), account)?)
            .to(mailbox(recipient)?)
            .subject(self.subject.clone().unwrap_or_default());

        for cc in &self.cc {
            builder = builder.cc(mailbox(cc)?);
        }
        for bcc in &self.bcc {
            builder = builder.bcc(mailbox(bcc)?);
        }

        assemble_body(
            builder,
            self.text_body.as_deref(),
            self.html_body.as_deref(),
            attachments,
        )
    }
}

/// A single send request with the server configuration supplied inline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSendRequest {
    /// Optional display name for the `From` header.
    pub name: Option<String>,

    pub to: Option<String>,

    pub subject: Option<String>,

    /// HTML body.
    pub body: Option<String>,

    #[serde(default)]
    pub attachments: Vec<AttachmentSpec>,

    /// Per-request SMTP configuration; nothing is persisted.
    pub server: Option<SmtpConfig>,
}

impl SingleSendRequest {
    /// Check that the recipient, body, and server are present and that
    /// the recipient is a syntactically valid address.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidInput`] or [`DispatchError::Validation`].
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.to.is_none() || self.body.is_none() || self.server.is_none() {
            return Err(DispatchError::InvalidInput(
                "body, to and server are required".to_string(),
            ));
        }

        if let Some(to) = &self.to {
            address::validate(to)?;
        }

        Ok(())
    }

    /// Build the single envelope.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Internal`] when the message builder rejects the
    /// pre-validated parts.
    pub fn build_message(&self, account: &str) -> Result<Message, DispatchError> {
        let recipient = self.to.as_deref().unwrap_or_default();
        let attachments = self
            .attachments
            .iter()
            .map(AttachmentSpec::normalize)
            .collect::<Result<Vec<_>, _>>()?;

        let builder = Message::builder()
            .from(sender_mailbox(self.name.as_deref(), account)?)
            .to(mailbox(recipient)?)
            .subject(self.subject.clone().unwrap_or_default());

        assemble_body(builder, None, self.body.as_deref(), &attachments)
    }
}

/// Attachment descriptor as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSpec {
    pub filename: String,

    pub content: AttachmentContent,

    /// MIME type; defaults to `application/octet-stream`.
    pub content_type: Option<String>,

    /// Set to `"base64"` when `content` is a base64 string.
    pub encoding: Option<String>,
}

/// Accepted shapes for attachment content.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttachmentContent {
    /// Raw byte array.
    Bytes(Vec<u8>),
    /// Serialized Node-style buffer (`{"type": "Buffer", "data": [...]}`).
    Buffer { data: Vec<u8> },
    /// Plain or base64-encoded string.
    Text(String),
}

impl AttachmentSpec {
    /// Normalise the payload to raw bytes and a parsed content type.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidInput`] on invalid base64 or an
    /// unparseable content type.
    pub fn normalize(&self) -> Result<NormalizedAttachment, DispatchError> {
        let data = match &self.content {
            AttachmentContent::Bytes(bytes) => bytes.clone(),
            AttachmentContent::Buffer { data } => data.clone(),
            AttachmentContent::Text(text) => {
                if self.encoding.as_deref() == Some("base64") {
                    BASE64.decode(text.trim()).map_err(|e| {
                        DispatchError::InvalidInput(format!(
                            "attachment {} is not valid base64: {e}",
                            self.filename
                        ))
                    })?
                } else {
                    text.clone().into_bytes()
                }
            }
        };

        let content_type = match &self.content_type {
            Some(raw) => ContentType::parse(raw).map_err(|e| {
                DispatchError::InvalidInput(format!(
                    "attachment {} has an invalid content type: {e}",
                    self.filename
                ))
            })?,
            None => octet_stream()?,
        };

        Ok(NormalizedAttachment {
            filename: self.filename.clone(),
            content_type,
            data,
        })
    }
}

/// An attachment reduced to the transport's expected binary form.
#[derive(Debug, Clone)]
pub struct NormalizedAttachment {
    pub filename: String,
    pub content_type: ContentType,
    pub data: Vec<u8>,
}

impl NormalizedAttachment {
    fn to_part(&self) -> SinglePart {
        Attachment::new(self.filename.clone()).body(self.data.clone(), self.content_type.clone())
    }
}

fn octet_stream() -> Result<ContentType, DispatchError> {
    ContentType::parse("application/octet-stream")
        .map_err(|e| DispatchError::Internal(format!("content type: {e}")))
}

fn mailbox(addr: &str) -> Result<Mailbox, DispatchError> {
    let address = addr
        .parse()
        .map_err(|e| DispatchError::Internal(format!("address {addr} rejected: {e}")))?;
    Ok(Mailbox::new(None, address))
}

fn sender_mailbox(display_name: Option<&str>, account: &str) -> Result<Mailbox, DispatchError> {
    let address = account
        .parse()
        .map_err(|e| DispatchError::Internal(format!("account address rejected: {e}")))?;
    Ok(Mailbox::new(display_name.map(str::to_string), address))
}

fn assemble_body(
    builder: lettre::message::MessageBuilder,
    text: Option<&str>,
    html: Option<&str>,
    attachments: &[NormalizedAttachment],
) -> Result<Message, DispatchError> {
    let content = match (text, html) {
        (Some(text), Some(html)) => BodyPart::Alternative(
            MultiPart::alternative_plain_html(text.to_string(), html.to_string()),
        ),
        (None, Some(html)) => BodyPart::Single(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html.to_string()),
        ),
        (Some(text), None) => BodyPart::Single(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(text.to_string()),
        ),
        (None, None) => BodyPart::Single(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(String::new()),
        ),
    };

    let message = if attachments.is_empty() {
        match content {
            BodyPart::Alternative(part) => builder.multipart(part),
            BodyPart::Single(part) => builder.singlepart(part),
        }
    } else {
        let mut mixed = match content {
            BodyPart::Alternative(part) => MultiPart::mixed().multipart(part),
            BodyPart::Single(part) => MultiPart::mixed().singlepart(part),
        };
        for attachment in attachments {
            mixed = mixed.singlepart(attachment.to_part());
        }
        builder.multipart(mixed)
    };

    message.map_err(|e| DispatchError::Internal(format!("failed to build message: {e}")))
}

enum BodyPart {
    Alternative(MultiPart),
    Single(SinglePart),
}
