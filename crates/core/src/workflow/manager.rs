//! Workflow instance creation.
//!
//! Turns a matched rule and its materialized step drafts into a
//! `WorkflowInstance` plus `StepRecord`s, ready to be committed as one
//! unit of work. A rule that materialized zero steps is rejected here —
//! uniformly, for every call site — as a configuration defect.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use acumen_shared::config::WorkflowSettings;
use acumen_shared::types::{StepRecordId, WorkflowInstanceId};

use super::error::WorkflowError;
use super::resolver::StepDraft;
use super::types::{InstanceStatus, StepDecision, StepRecord, TriggerEvent, WorkflowInstance};
use crate::rules::{AuditCategory, AuditRule, TriggerData};

/// Stateless construction of workflow instances.
pub struct WorkflowInstanceManager;

impl WorkflowInstanceManager {
    /// Builds an instance and its step records from resolved drafts.
    ///
    /// The first step starts `Pending`, later steps `Waiting`; while the
    /// instance is in review exactly one step is pending and it is always
    /// the current one.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NoMaterializableSteps` when `drafts` is
    /// empty.
    pub fn create(
        rule: &AuditRule,
        event: &TriggerEvent,
        drafts: Vec<StepDraft>,
        settings: &WorkflowSettings,
    ) -> Result<(WorkflowInstance, Vec<StepRecord>), WorkflowError> {
        if drafts.is_empty() {
            return Err(WorkflowError::NoMaterializableSteps { rule_id: rule.id });
        }

        let now = Utc::now();
        let instance_id = WorkflowInstanceId::new();
        let total_steps = u32::try_from(drafts.len()).unwrap_or(u32::MAX);

        let reason = event
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map_or_else(
                || Self::synthesize_reason(event.category, &event.trigger),
                ToString::to_string,
            );

        let steps: Vec<StepRecord> = drafts
            .into_iter()
            .map(|draft| StepRecord {
                id: StepRecordId::new(),
                instance_id,
                step_number: draft.step_number,
                name: draft.name,
                approver: draft.approver,
                decision: if draft.step_number == 1 {
                    StepDecision::Pending
                } else {
                    StepDecision::Waiting
                },
                comment: None,
                attachment: None,
                decided_at: None,
                expected_due_at: now + Duration::hours(draft.expected_hours),
            })
            .collect();

        let instance = WorkflowInstance {
            id: instance_id,
            serial_no: Self::serial_number(&settings.serial_prefix, now),
            rule_id: rule.id,
            category: event.category,
            subject: event.subject.clone(),
            status: InstanceStatus::InReview,
            current_step: 1,
            total_steps,
            applicant: event.applicant,
            reason,
            created_at: now,
            completed_at: None,
        };

        tracing::info!(
            instance_id = %instance.id,
            serial_no = %instance.serial_no,
            rule_id = %rule.id,
            total_steps,
            "workflow instance created"
        );

        Ok((instance, steps))
    }

    /// Generates a serial number: prefix, timestamp, 4 random hex chars.
    ///
    /// Unique but not strictly sequential.
    #[must_use]
    pub fn serial_number(prefix: &str, now: DateTime<Utc>) -> String {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(4)
            .collect::<String>()
            .to_uppercase();
        format!("{}{}{}", prefix, now.format("%Y%m%d%H%M%S"), suffix)
    }

    /// Derives a human-readable reason from trigger data when the
    /// applicant did not supply one.
    #[must_use]
    pub fn synthesize_reason(category: AuditCategory, trigger: &TriggerData) -> String {
        match category {
            AuditCategory::AmountChange => {
                match (
                    trigger.number("original_amount"),
                    trigger.number("new_amount"),
                ) {
                    (Some(original), Some(new)) => {
                        let direction = if new < original {
                            "decreased"
                        } else {
                            "increased"
                        };
                        let delta = (new - original).abs();
                        format!(
                            "Contract amount {direction} by \u{a5}{delta} ({original} -> {new})"
                        )
                    }
                    _ => Self::generic_reason(category),
                }
            }
            AuditCategory::QuoteApproval => trigger.number("amount").map_or_else(
                || Self::generic_reason(category),
                |amount| format!("Quote of \u{a5}{amount} submitted for approval"),
            ),
            AuditCategory::PaymentApproval => trigger.number("amount").map_or_else(
                || Self::generic_reason(category),
                |amount| format!("Payment of \u{a5}{amount} submitted for approval"),
            ),
            AuditCategory::FlowApproval => trigger.number("amount").map_or_else(
                || Self::generic_reason(category),
                |amount| format!("Bank remittance of \u{a5}{amount} awaiting confirmation"),
            ),
            AuditCategory::GenericTemplate => Self::generic_reason(category),
        }
    }

    fn generic_reason(category: AuditCategory) -> String {
        format!("Approval requested ({category})")
    }
}
