//! Step materialization.
//!
//! Expands a matched rule's step templates into concrete, contiguously
//! numbered step drafts: per-step conditions elide steps silently (that
//! is what they are for), unresolvable approvers skip steps with a logged
//! warning, and the survivors are renumbered 1..N so `total_steps` always
//! equals the materialized count.

use acumen_shared::types::UserId;

use super::directory::{RoleDirectory, UserDirectory};
use crate::rules::{ApproverSpec, AuditRule, StepTemplate, TriggerData};

/// A materialized step awaiting instance creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDraft {
    /// Contiguous 1-based position.
    pub step_number: u32,
    /// Human-readable step name.
    pub name: String,
    /// The resolved approver.
    pub approver: UserId,
    /// Expected processing duration in hours.
    pub expected_hours: i64,
}

/// Stateless expansion of step templates into step drafts.
pub struct StepResolver;

impl StepResolver {
    /// Materializes the steps of `rule` for `trigger`.
    ///
    /// For each template, in declared order:
    /// 1. Evaluate its optional condition; false means the step is not
    ///    materialized.
    /// 2. Resolve the approver: explicit users are validated against the
    ///    user directory, role lookups pick the lowest holder id (a
    ///    deterministic but non-load-bearing tie-break). An unresolvable
    ///    approver skips the step with a logged warning rather than
    ///    blocking the whole instance.
    ///
    /// `default_hours` applies to templates without a declared duration.
    #[must_use]
    pub fn resolve(
        rule: &AuditRule,
        trigger: &TriggerData,
        roles: &dyn RoleDirectory,
        users: &dyn UserDirectory,
        default_hours: i64,
    ) -> Vec<StepDraft> {
        let mut drafts = Vec::with_capacity(rule.steps.len());
        for template in &rule.steps {
            if let Some(condition) = &template.condition
                && !condition.evaluate(trigger)
            {
                continue;
            }

            let Some(approver) = Self::resolve_approver(rule, template, roles, users) else {
                continue;
            };

            drafts.push(StepDraft {
                step_number: u32::try_from(drafts.len() + 1).unwrap_or(u32::MAX),
                name: template.name.clone(),
                approver,
                expected_hours: template.expected_hours.unwrap_or(default_hours),
            });
        }
        drafts
    }

    fn resolve_approver(
        rule: &AuditRule,
        template: &StepTemplate,
        roles: &dyn RoleDirectory,
        users: &dyn UserDirectory,
    ) -> Option<UserId> {
        match &template.approver {
            ApproverSpec::ExplicitUser { id } => {
                if users.exists(*id) {
                    Some(*id)
                } else {
                    tracing::warn!(
                        rule_id = %rule.id,
                        step = %template.name,
                        user_id = %id,
                        "explicit approver does not exist, skipping step"
                    );
                    None
                }
            }
            ApproverSpec::RoleLookup { code } => {
                let holder = roles.lookup(code).into_iter().min();
                if holder.is_none() {
                    tracing::warn!(
                        rule_id = %rule.id,
                        step = %template.name,
                        role_code = %code,
                        "role has no active holders, skipping step"
                    );
                }
                holder
            }
        }
    }
}
