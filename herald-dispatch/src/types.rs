//! Per-recipient outcomes and the aggregated bulk report.

use serde::Serialize;

use crate::error::SendFailure;

/// Terminal state of one recipient's send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The server accepted the message for this recipient.
    Delivered,
    /// The send failed; `reason` carries the provider's rejection detail.
    Failed { reason: String },
}

impl From<Result<(), SendFailure>> for SendOutcome {
    fn from(result: Result<(), SendFailure>) -> Self {
        match result {
            Ok(()) => Self::Delivered,
            Err(failure) => Self::Failed {
                reason: failure.detail,
            },
        }
    }
}

/// One failed recipient with its error detail.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecipientError {
    pub recipient: String,
    pub error: String,
}

/// Aggregated result of a settle-all bulk dispatch.
///
/// The outcome lists partition the input recipient set: every recipient
/// appears in exactly one of `successful_recipients` and
/// `failed_recipients`, and the counts always sum to the input length.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub message: String,
    pub success_count: usize,
    pub failed_count: usize,
    pub successful_recipients: Vec<String>,
    pub failed_recipients: Vec<String>,
    pub errors: Vec<RecipientError>,
}

impl BulkReport {
    /// Fold per-recipient outcomes into a report.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<(String, SendOutcome)>) -> Self {
        let mut successful_recipients = Vec::new();
        let mut failed_recipients = Vec::new();
        let mut errors = Vec::new();

        for (recipient, outcome) in outcomes {
            match outcome {
                SendOutcome::Delivered => successful_recipients.push(recipient),
                SendOutcome::Failed { reason } => {
                    failed_recipients.push(recipient.clone());
                    errors.push(RecipientError {
                        recipient,
                        error: reason,
                    });
                }
            }
        }

        let success_count = successful_recipients.len();
        let failed_count = failed_recipients.len();

        Self {
            message: summary(success_count, failed_count).to_string(),
            success_count,
            failed_count,
            successful_recipients,
            failed_recipients,
            errors,
        }
    }
}

const fn summary(success_count: usize, failed_count: usize) -> &'static str {
    if success_count == 0 {
        "Failed to send any emails"
    } else if failed_count == 0 {
        "All emails sent successfully"
    } else {
        "Some emails were sent successfully"
    }
}
