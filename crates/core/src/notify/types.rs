//! Notification domain types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use acumen_shared::types::{UserId, WorkflowInstanceId};

use crate::rules::AuditCategory;

/// What happened to the workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// An instance was created; the first approver is notified.
    Created,
    /// The instance advanced; the new current approver is notified.
    Advanced,
    /// The instance finished approved; the applicant is notified.
    Approved,
    /// The instance finished rejected; the applicant is notified.
    Rejected,
}

impl NotificationKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Advanced => "advanced",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery priority hint for the external transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Routine notification.
    Normal,
    /// Needs attention (rejections).
    High,
}

/// A pending notification produced by a state transition.
///
/// Outbox events carry only plain identifying fields so the notify module
/// stays independent of the workflow types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEvent {
    /// What happened.
    pub kind: NotificationKind,
    /// Who should be told.
    pub recipient: UserId,
    /// The workflow instance concerned.
    pub instance_id: WorkflowInstanceId,
    /// The instance serial number.
    pub serial_no: String,
    /// The instance category.
    pub category: AuditCategory,
    /// The step the recipient is expected to act on, when applicable.
    pub step_number: Option<u32>,
}

/// A rendered notification ready for the external transport.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Who should receive it.
    pub recipient: UserId,
    /// Short title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Delivery priority hint.
    pub priority: NotificationPriority,
    /// Link into the approval UI.
    pub deep_link: String,
    /// Structured context for the transport.
    pub metadata: serde_json::Value,
}

/// Failure reported by a notification sink.
#[derive(Debug, Error)]
#[error("notification sink failure: {0}")]
pub struct SinkError(pub String);

/// External notification transport seam (email/SMS/push live elsewhere).
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` when delivery fails; the dispatcher logs it and
    /// moves on.
    fn send(&self, notification: &Notification) -> Result<(), SinkError>;
}
