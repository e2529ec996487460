//! The workflow engine facade.
//!
//! Wires matching, resolution, instance creation, the state machine, and
//! the notification dispatcher behind one entry point per operation.
//! Notifications are dispatched strictly after the store commit: a failed
//! transition sends nothing, a failed send never rolls back state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use acumen_shared::config::WorkflowSettings;
use acumen_shared::types::{StepRecordId, UserId, WorkflowInstanceId};

use super::directory::{RoleDirectory, UserDirectory};
use super::error::WorkflowError;
use super::manager::WorkflowInstanceManager;
use super::resolver::StepResolver;
use super::state_machine::ApprovalStateMachine;
use super::store::WorkflowStore;
use super::types::{Decision, DecideOutcome, OverdueStep, TriggerEvent, WorkflowStatusView};
use crate::notify::{NotificationDispatcher, NotificationKind, OutboxEvent};
use crate::rules::{RuleCatalog, RuleMatcher};

/// What a trigger submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No enabled rule matched; the business operation proceeds without
    /// an audit trail entry.
    AutoApproved,
    /// A workflow instance was created and is now in review.
    Created {
        /// The new instance.
        instance_id: WorkflowInstanceId,
        /// Its serial number.
        serial_no: String,
        /// Approver of the first step.
        current_approver: UserId,
    },
}

/// Rule-driven approval workflow engine.
pub struct WorkflowEngine<S: WorkflowStore> {
    catalog: RuleCatalog,
    store: S,
    roles: Arc<dyn RoleDirectory>,
    users: Arc<dyn UserDirectory>,
    dispatcher: NotificationDispatcher,
    settings: WorkflowSettings,
}

impl<S: WorkflowStore> WorkflowEngine<S> {
    /// Assembles an engine over a rule catalog and its collaborators.
    pub fn new(
        catalog: RuleCatalog,
        store: S,
        roles: Arc<dyn RoleDirectory>,
        users: Arc<dyn UserDirectory>,
        dispatcher: NotificationDispatcher,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            catalog,
            store,
            roles,
            users,
            dispatcher,
            settings,
        }
    }

    /// Submits a business trigger for audit.
    ///
    /// Matches the catalog, materializes steps, and creates an in-review
    /// instance; when no rule matches the event is auto-approved and
    /// nothing is stored. The first step's approver is notified after the
    /// instance commits.
    ///
    /// # Errors
    ///
    /// `WorkflowError::NoMaterializableSteps` when the matched rule
    /// produces no steps for this trigger, or `DuplicateInstance` on an
    /// id collision.
    pub fn submit(&self, event: &TriggerEvent) -> Result<SubmitOutcome, WorkflowError> {
        let Some(rule) = RuleMatcher::match_rule(&self.catalog, event.category, &event.trigger)
        else {
            tracing::debug!(
                category = %event.category,
                subject = %event.subject,
                "no audit rule matched, auto-approving"
            );
            return Ok(SubmitOutcome::AutoApproved);
        };

        let drafts = StepResolver::resolve(
            rule,
            &event.trigger,
            self.roles.as_ref(),
            self.users.as_ref(),
            self.settings.default_step_duration_hours,
        );
        let (instance, steps) = WorkflowInstanceManager::create(rule, event, drafts, &self.settings)?;

        let current_approver = steps[0].approver;
        let outbox = OutboxEvent {
            kind: NotificationKind::Created,
            recipient: current_approver,
            instance_id: instance.id,
            serial_no: instance.serial_no.clone(),
            category: instance.category,
            step_number: Some(1),
        };
        let outcome = SubmitOutcome::Created {
            instance_id: instance.id,
            serial_no: instance.serial_no.clone(),
            current_approver,
        };

        self.store.insert(instance, steps)?;
        self.dispatcher.dispatch_all(&[outbox]);
        Ok(outcome)
    }

    /// Applies an approver's decision to the current step.
    ///
    /// Runs under the instance's write lock; of two concurrent decisions
    /// on the same step, exactly one succeeds and the other fails its
    /// precondition checks.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InstanceNotFound`, or any state machine error.
    pub fn decide(
        &self,
        instance_id: WorkflowInstanceId,
        step_id: StepRecordId,
        approver: UserId,
        decision: Decision,
        comment: Option<String>,
        attachment: Option<String>,
    ) -> Result<DecideOutcome, WorkflowError> {
        let transition = self.store.update(instance_id, |instance, steps| {
            ApprovalStateMachine::decide(
                instance, steps, step_id, approver, decision, comment, attachment,
            )
        })?;
        self.dispatcher.dispatch_all(&transition.outbox);
        Ok(transition.outcome)
    }

    /// Cancels an in-review instance on behalf of its applicant.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InstanceNotFound`, `NotApplicant`, or
    /// `NotInReview`.
    pub fn cancel(
        &self,
        instance_id: WorkflowInstanceId,
        requester: UserId,
        reason: &str,
    ) -> Result<(), WorkflowError> {
        self.store.update(instance_id, |instance, steps| {
            ApprovalStateMachine::cancel(instance, steps, requester, reason)
        })
    }

    /// Reads a consistent snapshot of an instance and its steps.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InstanceNotFound`.
    pub fn status(&self, instance_id: WorkflowInstanceId) -> Result<WorkflowStatusView, WorkflowError> {
        self.store.view(instance_id)
    }

    /// Pending steps past their expected due time, across all in-review
    /// instances.
    #[must_use]
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<OverdueStep> {
        self.store.overdue(now)
    }
}
