//! Audit rule catalog.
//!
//! Rules arrive from configuration tooling as JSON definitions
//! (`RuleDef`); the catalog parses and validates them once at load time
//! and is immutable afterwards. The engine never re-parses conditions
//! per evaluation.

use serde::Deserialize;
use serde_json::Value;

use acumen_shared::types::{AuditRuleId, UserId};

use super::condition::Condition;
use super::error::RuleError;
use super::types::AuditCategory;

/// How a step's decision-maker is identified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ApproverSpec {
    /// A specific user.
    #[serde(rename = "user")]
    ExplicitUser {
        /// The approving user.
        id: UserId,
    },
    /// Any active holder of a role, resolved through the role directory.
    #[serde(rename = "role")]
    RoleLookup {
        /// The role code to look up.
        code: String,
    },
}

/// Authoring format for a step template.
#[derive(Debug, Clone, Deserialize)]
pub struct StepTemplateDef {
    /// Declared order within the rule (gaps allowed).
    pub order: u32,
    /// Human-readable step name.
    pub name: String,
    /// Who decides this step.
    pub approver: ApproverSpec,
    /// Optional single-comparison condition over trigger data.
    #[serde(default)]
    pub condition: Option<Value>,
    /// Expected processing duration in hours.
    #[serde(default)]
    pub expected_hours: Option<i64>,
}

/// Authoring format for an audit rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDef {
    /// Rule identifier (generated when absent).
    #[serde(default)]
    pub id: AuditRuleId,
    /// Business event category the rule applies to.
    pub category: AuditCategory,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Trigger condition definition (parsed at load).
    pub condition: Value,
    /// Ordered step templates.
    pub steps: Vec<StepTemplateDef>,
    /// Disabled rules are never matched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Priority for rule selection (lower = evaluated first).
    #[serde(default)]
    pub priority: i16,
}

fn default_enabled() -> bool {
    true
}

/// A validated step template.
#[derive(Debug, Clone)]
pub struct StepTemplate {
    /// Declared order within the rule.
    pub order: u32,
    /// Human-readable step name.
    pub name: String,
    /// Who decides this step.
    pub approver: ApproverSpec,
    /// Optional materialization condition.
    pub condition: Option<Condition>,
    /// Expected processing duration in hours (config default when absent).
    pub expected_hours: Option<i64>,
}

/// A validated audit rule.
///
/// Immutable from the engine's perspective.
#[derive(Debug, Clone)]
pub struct AuditRule {
    /// Rule identifier.
    pub id: AuditRuleId,
    /// Business event category the rule applies to.
    pub category: AuditCategory,
    /// Free-text description.
    pub description: String,
    /// Parsed trigger condition.
    pub condition: Condition,
    /// Step templates sorted by declared order.
    pub steps: Vec<StepTemplate>,
    /// Disabled rules are never matched.
    pub enabled: bool,
    /// Priority for rule selection (lower = evaluated first).
    pub priority: i16,
}

/// The configured set of audit rules, read-only at runtime.
#[derive(Debug, Default)]
pub struct RuleCatalog {
    // Sorted by ascending priority; the sort is stable so equal
    // priorities keep authoring order.
    rules: Vec<AuditRule>,
}

impl RuleCatalog {
    /// Parses and validates rule definitions into a catalog.
    ///
    /// # Errors
    ///
    /// Returns the first `RuleError` found; the catalog is all-or-nothing
    /// so a defective rule cannot silently become always-false.
    pub fn load(defs: Vec<RuleDef>) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(defs.len());
        for def in defs {
            rules.push(Self::validate(def)?);
        }
        rules.sort_by_key(|r| r.priority);
        Ok(Self { rules })
    }

    fn validate(def: RuleDef) -> Result<AuditRule, RuleError> {
        if def.steps.is_empty() {
            let label = if def.description.is_empty() {
                def.id.to_string()
            } else {
                def.description.clone()
            };
            return Err(RuleError::EmptySteps(label));
        }

        let condition = Condition::parse(&def.condition)?;

        let mut steps = Vec::with_capacity(def.steps.len());
        for step in def.steps {
            let step_condition = step
                .condition
                .as_ref()
                .map(Condition::parse_comparison)
                .transpose()?;
            steps.push(StepTemplate {
                order: step.order,
                name: step.name,
                approver: step.approver,
                condition: step_condition,
                expected_hours: step.expected_hours,
            });
        }
        steps.sort_by_key(|s| s.order);

        Ok(AuditRule {
            id: def.id,
            category: def.category,
            description: def.description,
            condition,
            steps,
            enabled: def.enabled,
            priority: def.priority,
        })
    }

    /// Enabled rules of a category, in ascending priority order.
    pub fn rules_for(&self, category: AuditCategory) -> impl Iterator<Item = &AuditRule> {
        self.rules
            .iter()
            .filter(move |r| r.enabled && r.category == category)
    }

    /// Looks up a rule by id (including disabled rules).
    #[must_use]
    pub fn get(&self, id: AuditRuleId) -> Option<&AuditRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Number of loaded rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
