//! Workflow domain types: instances, step records, and decisions.
//!
//! A `WorkflowInstance` is one running execution of an audit rule against
//! a specific business subject; its `StepRecord`s are the materialized,
//! addressable units of individual approval decisions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use acumen_shared::types::{AuditRuleId, StepRecordId, UserId, WorkflowInstanceId};

use crate::rules::{AuditCategory, TriggerData};

/// Workflow instance status.
///
/// `InReview` is the only non-terminal state. Leaving it is final:
/// rejection and cancellation end the instance immediately, approval
/// requires every materialized step approved in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Waiting on the current step's approver.
    InReview,
    /// Every step approved.
    Approved,
    /// An approver rejected; remaining steps were never processed.
    Rejected,
    /// The applicant withdrew the request.
    Cancelled,
}

impl InstanceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in_review" => Some(Self::InReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true once the instance can never change again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InReview)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision state of a single step record.
///
/// Exactly one step is `Pending` while the instance is in review; later
/// steps wait in `Waiting` and reach `Pending` only when the instance
/// advances to them. Each record leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDecision {
    /// Not yet reached; an earlier step is still under review.
    Waiting,
    /// Waiting for the assigned approver.
    Pending,
    /// Approved by the assigned approver.
    Approved,
    /// Rejected by the assigned approver.
    Rejected,
    /// Never processed (cancellation).
    Skipped,
}

impl StepDecision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "waiting" => Some(Self::Waiting),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns true once the step has been processed.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Skipped)
    }
}

impl fmt::Display for StepDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque reference to the audited business object.
///
/// The engine never dereferences it; contracts, quotes, and payments are
/// owned by their own modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRef {
    /// Business object type tag (e.g. "contract", "quote").
    pub kind: String,
    /// Business object identifier, as the owning module renders it.
    pub id: String,
}

impl SubjectRef {
    /// Creates a subject reference.
    #[must_use]
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// One running execution of an audit rule against a business subject.
///
/// Created once per triggering event; mutated only by the approval state
/// machine afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Instance identifier.
    pub id: WorkflowInstanceId,
    /// Unique serial number (timestamp plus random suffix).
    pub serial_no: String,
    /// The rule the instance was created from.
    pub rule_id: AuditRuleId,
    /// Business event category.
    pub category: AuditCategory,
    /// The audited business object.
    pub subject: SubjectRef,
    /// Current status.
    pub status: InstanceStatus,
    /// 1-based number of the step currently awaiting decision.
    pub current_step: u32,
    /// Count of materialized steps (never the raw template count).
    pub total_steps: u32,
    /// Who requested the audited change.
    pub applicant: UserId,
    /// Human-readable reason text.
    pub reason: String,
    /// When the instance was created.
    pub created_at: DateTime<Utc>,
    /// When the instance reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A materialized approval step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step record identifier.
    pub id: StepRecordId,
    /// Owning instance.
    pub instance_id: WorkflowInstanceId,
    /// Contiguous 1-based position, independent of template order.
    pub step_number: u32,
    /// Human-readable step name.
    pub name: String,
    /// The resolved approver.
    pub approver: UserId,
    /// Decision state.
    pub decision: StepDecision,
    /// Approver comment, or the cancellation reason for skipped steps.
    pub comment: Option<String>,
    /// Attachment reference supplied with the decision.
    pub attachment: Option<String>,
    /// When the step was decided.
    pub decided_at: Option<DateTime<Utc>>,
    /// SLA marker; overdue detection is a derived read over this field.
    pub expected_due_at: DateTime<Utc>,
}

/// A business event asking for an audit.
///
/// Supplied by the triggering business module (contract, quote, payment
/// services).
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    /// Business event category.
    pub category: AuditCategory,
    /// The audited business object.
    pub subject: SubjectRef,
    /// Named field values describing the event.
    pub trigger: TriggerData,
    /// Who requested the audited change.
    pub applicant: UserId,
    /// Applicant-supplied reason; synthesized from trigger data when absent.
    pub reason: Option<String>,
}

/// An approver's verdict on the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Approve the current step.
    Approve,
    /// Reject and terminate the instance.
    Reject,
}

/// What a decision did to the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecideOutcome {
    /// The instance moved on to the next step.
    Advanced {
        /// The new current step number.
        next_step: u32,
    },
    /// The instance reached a terminal status.
    Finished(InstanceStatus),
}

impl DecideOutcome {
    /// Returns true when the instance reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Read-only projection of an instance for UI and reporting.
///
/// Not part of the write path.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStatusView {
    /// Instance snapshot.
    pub instance: WorkflowInstance,
    /// Approver of the current pending step, while in review.
    pub current_approver: Option<UserId>,
    /// Full decision history in step order.
    pub steps: Vec<StepRecord>,
}

/// A pending step past its expected due time.
#[derive(Debug, Clone, Serialize)]
pub struct OverdueStep {
    /// Owning instance.
    pub instance_id: WorkflowInstanceId,
    /// Owning instance serial number.
    pub serial_no: String,
    /// The overdue step.
    pub step: StepRecord,
}
