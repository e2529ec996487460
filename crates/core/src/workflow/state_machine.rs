//! The approval state machine.
//!
//! `in_review` is the initial state, implicit at instance creation;
//! `approved`, `rejected`, and `cancelled` are terminal. Transitions
//! mutate the instance and its steps in place (the store runs them under
//! the per-instance lock) and return an outbox of notification events.
//! Nothing here performs I/O: dispatch happens strictly after commit.

use chrono::Utc;

use acumen_shared::types::{StepRecordId, UserId};

use super::error::WorkflowError;
use super::types::{
    Decision, DecideOutcome, InstanceStatus, StepDecision, StepRecord, WorkflowInstance,
};
use crate::notify::{NotificationKind, OutboxEvent};

/// Result of a successful transition.
#[derive(Debug)]
pub struct Transition {
    /// What the decision did to the instance.
    pub outcome: DecideOutcome,
    /// Notification events to dispatch after commit.
    pub outbox: Vec<OutboxEvent>,
}

/// Stateless transition logic for approve/reject/cancel decisions.
pub struct ApprovalStateMachine;

impl ApprovalStateMachine {
    /// Processes an approver's decision on the current step.
    ///
    /// Preconditions, checked in order:
    /// 1. The instance is still in review.
    /// 2. The step exists and has not already been decided (a replay is a
    ///    state error, never a silent no-op).
    /// 3. The step is the current one.
    /// 4. The caller is the step's assigned approver.
    ///
    /// Rejection terminates the instance immediately regardless of
    /// remaining steps. Approval advances to the next step, or terminates
    /// approved when the current step is the last.
    ///
    /// # Errors
    ///
    /// `WorkflowError::NotInReview`, `StepNotFound`, `StepAlreadyDecided`,
    /// `StepNotCurrent`, or `NotAssignedApprover`; the instance and steps
    /// are unchanged on every error path.
    pub fn decide(
        instance: &mut WorkflowInstance,
        steps: &mut [StepRecord],
        step_id: StepRecordId,
        approver: UserId,
        decision: Decision,
        comment: Option<String>,
        attachment: Option<String>,
    ) -> Result<Transition, WorkflowError> {
        if instance.status.is_terminal() {
            return Err(WorkflowError::NotInReview {
                instance_id: instance.id,
                status: instance.status,
            });
        }

        let index = steps
            .iter()
            .position(|s| s.id == step_id)
            .ok_or(WorkflowError::StepNotFound(step_id))?;
        if steps[index].decision.is_decided() {
            return Err(WorkflowError::StepAlreadyDecided { step_id });
        }
        if steps[index].step_number != instance.current_step {
            return Err(WorkflowError::StepNotCurrent {
                step_id,
                step_number: steps[index].step_number,
                current_step: instance.current_step,
            });
        }
        if steps[index].approver != approver {
            return Err(WorkflowError::NotAssignedApprover {
                user_id: approver,
                step_id,
            });
        }

        let now = Utc::now();
        {
            let step = &mut steps[index];
            step.comment = comment;
            step.attachment = attachment;
            step.decided_at = Some(now);
            step.decision = match decision {
                Decision::Approve => StepDecision::Approved,
                Decision::Reject => StepDecision::Rejected,
            };
        }

        let transition = match decision {
            Decision::Reject => {
                instance.status = InstanceStatus::Rejected;
                instance.completed_at = Some(now);
                Transition {
                    outcome: DecideOutcome::Finished(InstanceStatus::Rejected),
                    outbox: vec![Self::event(
                        instance,
                        NotificationKind::Rejected,
                        instance.applicant,
                        None,
                    )],
                }
            }
            Decision::Approve if instance.current_step < instance.total_steps => {
                instance.current_step += 1;
                let next = steps
                    .iter_mut()
                    .find(|s| s.step_number == instance.current_step)
                    .ok_or(WorkflowError::InstanceNotFound(instance.id))?;
                next.decision = StepDecision::Pending;
                let next_approver = next.approver;
                let next_number = next.step_number;
                Transition {
                    outcome: DecideOutcome::Advanced {
                        next_step: next_number,
                    },
                    outbox: vec![Self::event(
                        instance,
                        NotificationKind::Advanced,
                        next_approver,
                        Some(next_number),
                    )],
                }
            }
            Decision::Approve => {
                instance.status = InstanceStatus::Approved;
                instance.completed_at = Some(now);
                Transition {
                    outcome: DecideOutcome::Finished(InstanceStatus::Approved),
                    outbox: vec![Self::event(
                        instance,
                        NotificationKind::Approved,
                        instance.applicant,
                        None,
                    )],
                }
            }
        };

        tracing::info!(
            instance_id = %instance.id,
            serial_no = %instance.serial_no,
            step_id = %step_id,
            status = %instance.status,
            current_step = instance.current_step,
            "workflow decision processed"
        );

        Ok(transition)
    }

    /// Cancels an in-review instance on behalf of its applicant.
    ///
    /// Undecided steps are marked skipped (not approved or rejected) with
    /// the cancellation reason as their comment. No approver notification
    /// is produced.
    ///
    /// # Errors
    ///
    /// `WorkflowError::NotInReview` or `NotApplicant`; the instance and
    /// steps are unchanged on every error path.
    pub fn cancel(
        instance: &mut WorkflowInstance,
        steps: &mut [StepRecord],
        requester: UserId,
        reason: &str,
    ) -> Result<(), WorkflowError> {
        if instance.status.is_terminal() {
            return Err(WorkflowError::NotInReview {
                instance_id: instance.id,
                status: instance.status,
            });
        }
        if requester != instance.applicant {
            return Err(WorkflowError::NotApplicant {
                user_id: requester,
                instance_id: instance.id,
            });
        }

        let now = Utc::now();
        for step in steps.iter_mut().filter(|s| !s.decision.is_decided()) {
            step.decision = StepDecision::Skipped;
            step.comment = Some(reason.to_string());
            step.decided_at = Some(now);
        }
        instance.status = InstanceStatus::Cancelled;
        instance.completed_at = Some(now);

        tracing::info!(
            instance_id = %instance.id,
            serial_no = %instance.serial_no,
            "workflow instance cancelled by applicant"
        );

        Ok(())
    }

    fn event(
        instance: &WorkflowInstance,
        kind: NotificationKind,
        recipient: UserId,
        step_number: Option<u32>,
    ) -> OutboxEvent {
        OutboxEvent {
            kind,
            recipient,
            instance_id: instance.id,
            serial_no: instance.serial_no.clone(),
            category: instance.category,
            step_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::AuditCategory;
    use crate::workflow::types::SubjectRef;
    use acumen_shared::types::{AuditRuleId, WorkflowInstanceId};
    use chrono::Duration;

    fn fixture(total: u32) -> (WorkflowInstance, Vec<StepRecord>) {
        let now = Utc::now();
        let instance_id = WorkflowInstanceId::new();
        let steps = (1..=total)
            .map(|n| StepRecord {
                id: StepRecordId::new(),
                instance_id,
                step_number: n,
                name: format!("Step {n}"),
                approver: UserId::new(),
                decision: if n == 1 {
                    StepDecision::Pending
                } else {
                    StepDecision::Waiting
                },
                comment: None,
                attachment: None,
                decided_at: None,
                expected_due_at: now + Duration::hours(24),
            })
            .collect();
        let instance = WorkflowInstance {
            id: instance_id,
            serial_no: "WF202608231200000001".to_string(),
            rule_id: AuditRuleId::new(),
            category: AuditCategory::AmountChange,
            subject: SubjectRef::new("contract", "C-1"),
            status: InstanceStatus::InReview,
            current_step: 1,
            total_steps: total,
            applicant: UserId::new(),
            reason: "test".to_string(),
            created_at: now,
            completed_at: None,
        };
        (instance, steps)
    }

    #[test]
    fn test_approve_advances_and_promotes_next_step() {
        let (mut instance, mut steps) = fixture(2);
        let step_id = steps[0].id;
        let approver = steps[0].approver;
        let transition = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            Some("looks right".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(transition.outcome, DecideOutcome::Advanced { next_step: 2 });
        assert_eq!(instance.status, InstanceStatus::InReview);
        assert_eq!(instance.current_step, 2);
        assert_eq!(steps[0].decision, StepDecision::Approved);
        assert_eq!(steps[0].comment.as_deref(), Some("looks right"));
        assert!(steps[0].decided_at.is_some());
        assert_eq!(steps[1].decision, StepDecision::Pending);

        // The new current approver is notified.
        assert_eq!(transition.outbox.len(), 1);
        assert_eq!(transition.outbox[0].kind, NotificationKind::Advanced);
        assert_eq!(transition.outbox[0].recipient, steps[1].approver);
        assert_eq!(transition.outbox[0].step_number, Some(2));
    }

    #[test]
    fn test_approve_last_step_terminates_approved() {
        let (mut instance, mut steps) = fixture(1);
        let step_id = steps[0].id;
        let approver = steps[0].approver;
        let transition = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap();

        assert_eq!(
            transition.outcome,
            DecideOutcome::Finished(InstanceStatus::Approved)
        );
        assert_eq!(instance.status, InstanceStatus::Approved);
        assert!(instance.completed_at.is_some());
        assert_eq!(transition.outbox[0].kind, NotificationKind::Approved);
        assert_eq!(transition.outbox[0].recipient, instance.applicant);
    }

    #[test]
    fn test_reject_short_circuits() {
        let (mut instance, mut steps) = fixture(3);
        let step_id = steps[0].id;
        let approver = steps[0].approver;
        let transition = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Reject,
            Some("numbers do not add up".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(
            transition.outcome,
            DecideOutcome::Finished(InstanceStatus::Rejected)
        );
        assert_eq!(instance.status, InstanceStatus::Rejected);
        assert!(instance.completed_at.is_some());
        // Remaining steps never reach pending.
        assert_eq!(steps[1].decision, StepDecision::Waiting);
        assert_eq!(steps[2].decision, StepDecision::Waiting);
        assert_eq!(transition.outbox[0].kind, NotificationKind::Rejected);
        assert_eq!(transition.outbox[0].recipient, instance.applicant);
    }

    #[test]
    fn test_wrong_approver_is_authorization_error() {
        let (mut instance, mut steps) = fixture(2);
        let imposter = UserId::new();
        let step_id = steps[0].id;
        let err = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            imposter,
            Decision::Approve,
            None,
            None,
        )
        .unwrap_err();

        assert!(err.is_authorization_error());
        // No state change.
        assert_eq!(instance.current_step, 1);
        assert_eq!(steps[0].decision, StepDecision::Pending);
        assert!(steps[0].decided_at.is_none());
    }

    #[test]
    fn test_replay_is_state_error() {
        let (mut instance, mut steps) = fixture(2);
        let step_id = steps[0].id;
        let approver = steps[0].approver;
        ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap();

        let err = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::StepAlreadyDecided { .. }));
        assert_eq!(instance.current_step, 2);
    }

    #[test]
    fn test_decide_on_terminal_instance_is_state_error() {
        let (mut instance, mut steps) = fixture(1);
        let step_id = steps[0].id;
        let approver = steps[0].approver;
        ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Reject,
            None,
            None,
        )
        .unwrap();

        let err = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::NotInReview { .. }));
    }

    #[test]
    fn test_decide_on_future_step_is_state_error() {
        let (mut instance, mut steps) = fixture(2);
        let step_id = steps[1].id;
        let approver = steps[1].approver;
        let err = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::StepNotCurrent { .. }));
        assert_eq!(steps[1].decision, StepDecision::Waiting);
    }

    #[test]
    fn test_unknown_step_is_not_found() {
        let (mut instance, mut steps) = fixture(1);
        let approver = steps[0].approver;
        let err = ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            StepRecordId::new(),
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::StepNotFound(_)));
    }

    #[test]
    fn test_cancel_by_applicant_skips_undecided_steps() {
        let (mut instance, mut steps) = fixture(3);
        let step_id = steps[0].id;
        let approver = steps[0].approver;
        let applicant = instance.applicant;
        // Approve step 1 first so one step is already decided.
        ApprovalStateMachine::decide(
            &mut instance,
            &mut steps,
            step_id,
            approver,
            Decision::Approve,
            None,
            None,
        )
        .unwrap();

        ApprovalStateMachine::cancel(&mut instance, &mut steps, applicant, "subject withdrawn")
            .unwrap();

        assert_eq!(instance.status, InstanceStatus::Cancelled);
        assert!(instance.completed_at.is_some());
        assert_eq!(steps[0].decision, StepDecision::Approved);
        assert_eq!(steps[1].decision, StepDecision::Skipped);
        assert_eq!(steps[1].comment.as_deref(), Some("subject withdrawn"));
        assert_eq!(steps[2].decision, StepDecision::Skipped);
    }

    #[test]
    fn test_cancel_by_non_applicant_is_authorization_error() {
        let (mut instance, mut steps) = fixture(1);
        let err =
            ApprovalStateMachine::cancel(&mut instance, &mut steps, UserId::new(), "nope")
                .unwrap_err();
        assert!(matches!(err, WorkflowError::NotApplicant { .. }));
        assert_eq!(instance.status, InstanceStatus::InReview);
    }

    #[test]
    fn test_cancel_terminal_instance_is_state_error() {
        let (mut instance, mut steps) = fixture(1);
        let applicant = instance.applicant;
        ApprovalStateMachine::cancel(&mut instance, &mut steps, applicant, "first").unwrap();
        let err = ApprovalStateMachine::cancel(&mut instance, &mut steps, applicant, "again")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotInReview { .. }));
    }
}
