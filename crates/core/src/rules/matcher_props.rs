//! Property-based tests for RuleMatcher.
//!
//! These tests validate determinism and priority ordering of rule
//! matching for randomized rule sets and trigger data.

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use crate::rules::catalog::{RuleCatalog, RuleDef};
use crate::rules::matcher::RuleMatcher;
use crate::rules::types::{AuditCategory, TriggerData};

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 0))
}

/// Strategy for generating a threshold rule definition.
fn threshold_def(priority: i16, threshold: i64) -> RuleDef {
    serde_json::from_value(json!({
        "category": "payment_approval",
        "description": format!("p{priority} t{threshold}"),
        "condition": { "kind": "threshold", "field": "amount", "op": ">=", "value": threshold },
        "steps": [
            { "order": 1, "name": "Review", "approver": { "type": "role", "code": "supervisor" } },
        ],
        "priority": priority,
    }))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For a fixed rule set and trigger data, matching always returns the
    /// same rule (or none).
    #[test]
    fn prop_match_is_deterministic(
        amount in arb_amount(),
        thresholds in prop::collection::vec((0i16..50, 0i64..1_000_000), 1..8)
    ) {
        let defs: Vec<RuleDef> = thresholds
            .iter()
            .map(|(p, t)| threshold_def(*p, *t))
            .collect();
        let catalog = RuleCatalog::load(defs).unwrap();
        let trigger = TriggerData::new().with_number("amount", amount);

        let first = RuleMatcher::match_rule(&catalog, AuditCategory::PaymentApproval, &trigger)
            .map(|r| r.id);
        for _ in 0..3 {
            let again =
                RuleMatcher::match_rule(&catalog, AuditCategory::PaymentApproval, &trigger)
                    .map(|r| r.id);
            prop_assert_eq!(first, again);
        }
    }

    /// If the selected rule has priority p, no matching rule with a lower
    /// priority number exists.
    #[test]
    fn prop_priority_ordering(
        amount in arb_amount(),
        thresholds in prop::collection::vec((0i16..50, 0i64..1_000_000), 1..8)
    ) {
        let defs: Vec<RuleDef> = thresholds
            .iter()
            .map(|(p, t)| threshold_def(*p, *t))
            .collect();
        let catalog = RuleCatalog::load(defs).unwrap();
        let trigger = TriggerData::new().with_number("amount", amount);

        if let Some(selected) =
            RuleMatcher::match_rule(&catalog, AuditCategory::PaymentApproval, &trigger)
        {
            for rule in catalog.rules_for(AuditCategory::PaymentApproval) {
                if rule.priority < selected.priority {
                    prop_assert!(
                        !rule.condition.evaluate(&trigger),
                        "lower-priority-number rule {} also matched",
                        rule.description
                    );
                }
            }
        }
    }

    /// A trigger without the inspected field never matches any threshold
    /// rule (fail-closed).
    #[test]
    fn prop_absent_field_never_matches(
        thresholds in prop::collection::vec((0i16..50, 0i64..1_000_000), 1..8)
    ) {
        let defs: Vec<RuleDef> = thresholds
            .iter()
            .map(|(p, t)| threshold_def(*p, *t))
            .collect();
        let catalog = RuleCatalog::load(defs).unwrap();
        let trigger = TriggerData::new();

        prop_assert!(
            RuleMatcher::match_rule(&catalog, AuditCategory::PaymentApproval, &trigger).is_none()
        );
    }
}
