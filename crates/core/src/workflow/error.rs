//! Workflow error types.
//!
//! The taxonomy separates configuration defects (authoring time),
//! authorization violations (wrong approver), and state violations
//! (invalid transition, replay). State and authorization violations are
//! always rejected explicitly, never silently no-opped.

use thiserror::Error;

use acumen_shared::error::AppError;
use acumen_shared::types::{StepRecordId, UserId, WorkflowInstanceId};

use super::types::InstanceStatus;
use crate::rules::RuleError;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A rule definition failed validation at load time.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// A matched rule materialized zero steps.
    ///
    /// A rule that can never produce an approver is an authoring defect,
    /// not a runtime business outcome. The policy is uniform across all
    /// call sites.
    #[error("Rule {rule_id} materialized no approval steps for this trigger")]
    NoMaterializableSteps {
        /// The defective rule.
        rule_id: acumen_shared::types::AuditRuleId,
    },

    /// A decision by someone other than the step's assigned approver.
    #[error("User {user_id} is not the assigned approver for step {step_id}")]
    NotAssignedApprover {
        /// Who attempted the decision.
        user_id: UserId,
        /// The step they attempted to decide.
        step_id: StepRecordId,
    },

    /// A cancellation by someone other than the original applicant.
    #[error("User {user_id} is not the applicant of instance {instance_id}")]
    NotApplicant {
        /// Who attempted the cancellation.
        user_id: UserId,
        /// The instance they attempted to cancel.
        instance_id: WorkflowInstanceId,
    },

    /// An operation on an instance that already left review.
    #[error("Instance {instance_id} is {status}, not in review")]
    NotInReview {
        /// The instance.
        instance_id: WorkflowInstanceId,
        /// Its terminal status.
        status: InstanceStatus,
    },

    /// A replayed decision on an already-processed step.
    #[error("Step {step_id} has already been decided")]
    StepAlreadyDecided {
        /// The replayed step.
        step_id: StepRecordId,
    },

    /// A decision on a step other than the current one.
    #[error("Step {step_id} is step {step_number}, but the instance is at step {current_step}")]
    StepNotCurrent {
        /// The step decided on.
        step_id: StepRecordId,
        /// Its position.
        step_number: u32,
        /// The instance's current position.
        current_step: u32,
    },

    /// Unknown workflow instance.
    #[error("Workflow instance {0} not found")]
    InstanceNotFound(WorkflowInstanceId),

    /// Unknown step within an instance.
    #[error("Step {0} not found")]
    StepNotFound(StepRecordId),

    /// An instance created twice under the same id.
    #[error("Workflow instance {0} already exists")]
    DuplicateInstance(WorkflowInstanceId),
}

impl WorkflowError {
    /// Returns true for authorization violations.
    #[must_use]
    pub const fn is_authorization_error(&self) -> bool {
        matches!(
            self,
            Self::NotAssignedApprover { .. } | Self::NotApplicant { .. }
        )
    }

    /// Returns true for invalid-transition and replay violations.
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(
            self,
            Self::NotInReview { .. } | Self::StepAlreadyDecided { .. } | Self::StepNotCurrent { .. }
        )
    }

    /// Returns true for configuration defects.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Rule(_) | Self::NoMaterializableSteps { .. })
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Rule(e) => e.status_code(),
            Self::NoMaterializableSteps { .. } => 422,
            Self::NotAssignedApprover { .. } | Self::NotApplicant { .. } => 403,
            Self::NotInReview { .. }
            | Self::StepAlreadyDecided { .. }
            | Self::StepNotCurrent { .. }
            | Self::DuplicateInstance(_) => 409,
            Self::InstanceNotFound(_) | Self::StepNotFound(_) => 404,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Rule(e) => e.error_code(),
            Self::NoMaterializableSteps { .. } => "NO_MATERIALIZABLE_STEPS",
            Self::NotAssignedApprover { .. } => "NOT_ASSIGNED_APPROVER",
            Self::NotApplicant { .. } => "NOT_APPLICANT",
            Self::NotInReview { .. } => "NOT_IN_REVIEW",
            Self::StepAlreadyDecided { .. } => "STEP_ALREADY_DECIDED",
            Self::StepNotCurrent { .. } => "STEP_NOT_CURRENT",
            Self::InstanceNotFound(_) => "INSTANCE_NOT_FOUND",
            Self::StepNotFound(_) => "STEP_NOT_FOUND",
            Self::DuplicateInstance(_) => "DUPLICATE_INSTANCE",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Rule(_) | WorkflowError::NoMaterializableSteps { .. } => {
                Self::Configuration(message)
            }
            WorkflowError::NotAssignedApprover { .. } | WorkflowError::NotApplicant { .. } => {
                Self::Forbidden(message)
            }
            WorkflowError::NotInReview { .. }
            | WorkflowError::StepAlreadyDecided { .. }
            | WorkflowError::StepNotCurrent { .. }
            | WorkflowError::DuplicateInstance(_) => Self::Conflict(message),
            WorkflowError::InstanceNotFound(_) | WorkflowError::StepNotFound(_) => {
                Self::NotFound(message)
            }
        }
    }
}
