//! Property-based tests for the approval state machine.
//!
//! These tests validate the structural invariants over randomized chain
//! lengths and decision positions: one pending step while in review,
//! terminal immutability, and rejection short-circuit.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use acumen_shared::types::{AuditRuleId, StepRecordId, UserId, WorkflowInstanceId};

use crate::rules::types::AuditCategory;
use crate::workflow::state_machine::ApprovalStateMachine;
use crate::workflow::types::{
    Decision, InstanceStatus, StepDecision, StepRecord, SubjectRef, WorkflowInstance,
};

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
        serial_no: "WF202608240930001A2B".to_string(),
        rule_id: AuditRuleId::new(),
        category: AuditCategory::FlowApproval,
        subject: SubjectRef::new("remittance", "R-1"),
        status: InstanceStatus::InReview,
        current_step: 1,
        total_steps: total,
        applicant: UserId::new(),
        reason: "prop".to_string(),
        created_at: now,
        completed_at: None,
    };
    (instance, steps)
}

fn pending_count(steps: &[StepRecord]) -> usize {
    steps
        .iter()
        .filter(|s| s.decision == StepDecision::Pending)
        .count()
}

fn assert_single_pending(
    instance: &WorkflowInstance,
    steps: &[StepRecord],
) -> Result<(), TestCaseError> {
    if instance.status == InstanceStatus::InReview {
        prop_assert_eq!(pending_count(steps), 1);
        let pending = steps
            .iter()
            .find(|s| s.decision == StepDecision::Pending)
            .unwrap();
        prop_assert_eq!(pending.step_number, instance.current_step);
    } else {
        prop_assert_eq!(pending_count(steps), 0);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Exactly one step is pending while in review, and it is always the
    /// current one; terminal instances have none.
    #[test]
    fn prop_single_pending_step(total in 1u32..8) {
        let (mut instance, mut steps) = fixture(total);
        assert_single_pending(&instance, &steps)?;

        for n in 1..=total {
            let current = steps.iter().find(|s| s.step_number == n).unwrap();
            let (step_id, approver) = (current.id, current.approver);
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
            assert_single_pending(&instance, &steps)?;
        }
        prop_assert_eq!(instance.status, InstanceStatus::Approved);
    }

    /// Rejection at any position terminates the instance and leaves every
    /// later step waiting forever.
    #[test]
    fn prop_rejection_short_circuits((total, reject_at) in (1u32..8)
        .prop_flat_map(|total| (Just(total), 1..=total)))
    {
        let (mut instance, mut steps) = fixture(total);

        for n in 1..reject_at {
            let current = steps.iter().find(|s| s.step_number == n).unwrap();
            let (step_id, approver) = (current.id, current.approver);
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
        }

        let current = steps.iter().find(|s| s.step_number == reject_at).unwrap();
        let (step_id, approver) = (current.id, current.approver);
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

        prop_assert_eq!(instance.status, InstanceStatus::Rejected);
        prop_assert!(instance.completed_at.is_some());
        for step in &steps {
            if step.step_number < reject_at {
                prop_assert_eq!(step.decision, StepDecision::Approved);
            } else if step.step_number == reject_at {
                prop_assert_eq!(step.decision, StepDecision::Rejected);
            } else {
                prop_assert_eq!(step.decision, StepDecision::Waiting);
            }
        }
    }

    /// Once terminal, every further decision fails and nothing changes.
    #[test]
    fn prop_terminal_is_immutable(total in 1u32..8, target in 0usize..8) {
        let (mut instance, mut steps) = fixture(total);
        let applicant = instance.applicant;
        ApprovalStateMachine::cancel(&mut instance, &mut steps, applicant, "done").unwrap();

        let frozen_status = instance.status;
        let frozen_steps: Vec<StepDecision> = steps.iter().map(|s| s.decision).collect();

        let target = &steps[target % steps.len()];
        let (step_id, approver) = (target.id, target.approver);
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

        prop_assert!(err.is_state_error());
        prop_assert_eq!(instance.status, frozen_status);
        let after: Vec<StepDecision> = steps.iter().map(|s| s.decision).collect();
        prop_assert_eq!(after, frozen_steps);
    }
}
