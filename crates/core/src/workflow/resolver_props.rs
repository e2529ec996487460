//! Property-based tests for StepResolver.
//!
//! These tests validate that materialization selects exactly the
//! templates whose conditions hold and that surviving steps are always
//! renumbered contiguously, for randomized template sets.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use acumen_shared::types::UserId;
use uuid::Uuid;

use crate::rules::catalog::{AuditRule, RuleCatalog, RuleDef};
use crate::rules::types::{AuditCategory, TriggerData};
use crate::workflow::directory::fixtures::{StaticRoles, StaticUsers};
use crate::workflow::resolver::StepResolver;

fn user(n: u128) -> UserId {
    UserId::from_uuid(Uuid::from_u128(n))
}

/// Builds a rule whose step `i` is guarded by `amount >= thresholds[i]`
/// and approved by the role `roles[i]`.
fn rule_with_steps(thresholds: &[i64], roles: &[&str]) -> AuditRule {
    let steps: Vec<serde_json::Value> = thresholds
        .iter()
        .zip(roles)
        .enumerate()
        .map(|(i, (threshold, role))| {
            json!({
                "order": i + 1,
                "name": format!("Step {}", i + 1),
                "approver": { "type": "role", "code": role },
                "condition": {
                    "kind": "threshold", "field": "amount", "op": ">=", "value": threshold,
                },
            })
        })
        .collect();
    let def: RuleDef = serde_json::from_value(json!({
        "category": "payment_approval",
        "condition": { "kind": "threshold", "field": "amount", "op": ">=", "value": 0 },
        "steps": steps,
    }))
    .unwrap();
    let catalog = RuleCatalog::load(vec![def]).unwrap();
    catalog
        .rules_for(AuditCategory::PaymentApproval)
        .next()
        .unwrap()
        .clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The materialized steps are exactly the templates whose conditions
    /// hold for the trigger, in declared order.
    #[test]
    fn prop_materialized_set_matches_conditions(
        amount in 0i64..1_000_000,
        thresholds in prop::collection::vec(0i64..1_000_000, 1..8)
    ) {
        let roles: Vec<&str> = thresholds.iter().map(|_| "reviewer").collect();
        let rule = rule_with_steps(&thresholds, &roles);
        let trigger = TriggerData::new().with_number("amount", Decimal::new(amount, 0));
        let directory = StaticRoles::default().with_role("reviewer", vec![user(1)]);

        let drafts =
            StepResolver::resolve(&rule, &trigger, &directory, &StaticUsers::permissive(), 24);

        let expected: Vec<String> = thresholds
            .iter()
            .enumerate()
            .filter(|(_, t)| amount >= **t)
            .map(|(i, _)| format!("Step {}", i + 1))
            .collect();
        let names: Vec<String> = drafts.iter().map(|d| d.name.clone()).collect();
        prop_assert_eq!(names, expected);
    }

    /// Surviving steps are numbered 1..N with no gaps, whatever was
    /// elided or skipped before them.
    #[test]
    fn prop_step_numbers_are_contiguous(
        amount in 0i64..1_000_000,
        thresholds in prop::collection::vec(0i64..1_000_000, 1..8),
        holders in prop::collection::vec(prop::bool::ANY, 1..8)
    ) {
        let roles: Vec<&str> = holders
            .iter()
            .cycle()
            .take(thresholds.len())
            .map(|held| if *held { "staffed" } else { "vacant" })
            .collect();
        let rule = rule_with_steps(&thresholds, &roles);
        let trigger = TriggerData::new().with_number("amount", Decimal::new(amount, 0));
        let directory = StaticRoles::default().with_role("staffed", vec![user(1)]);

        let drafts =
            StepResolver::resolve(&rule, &trigger, &directory, &StaticUsers::permissive(), 24);

        for (i, draft) in drafts.iter().enumerate() {
            prop_assert_eq!(draft.step_number as usize, i + 1);
        }
    }

    /// A vacant role never produces a draft, and staffed steps survive it.
    #[test]
    fn prop_vacant_roles_never_materialize(
        holders in prop::collection::vec(prop::bool::ANY, 1..8)
    ) {
        let thresholds: Vec<i64> = holders.iter().map(|_| 0).collect();
        let roles: Vec<&str> = holders
            .iter()
            .map(|held| if *held { "staffed" } else { "vacant" })
            .collect();
        let rule = rule_with_steps(&thresholds, &roles);
        let trigger = TriggerData::new().with_number("amount", Decimal::new(1, 0));
        let directory = StaticRoles::default().with_role("staffed", vec![user(1)]);

        let drafts =
            StepResolver::resolve(&rule, &trigger, &directory, &StaticUsers::permissive(), 24);

        let staffed = holders.iter().filter(|held| **held).count();
        prop_assert_eq!(drafts.len(), staffed);
        prop_assert!(drafts.iter().all(|d| d.approver == user(1)));
    }
}
