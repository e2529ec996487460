//! Rule matching against trigger data.

use super::catalog::{AuditRule, RuleCatalog};
use super::types::{AuditCategory, TriggerData};

/// Stateless matcher over the rule catalog.
///
/// Matching is a pure function of (catalog, category, trigger data) and is
/// safe for unbounded concurrent calls.
pub struct RuleMatcher;

impl RuleMatcher {
    /// Returns the first enabled rule of `category`, in ascending priority
    /// order, whose trigger condition holds for `trigger`.
    ///
    /// `None` means no audit is required and the caller should treat the
    /// event as auto-approved.
    #[must_use]
    pub fn match_rule<'a>(
        catalog: &'a RuleCatalog,
        category: AuditCategory,
        trigger: &TriggerData,
    ) -> Option<&'a AuditRule> {
        for rule in catalog.rules_for(category) {
            if rule.condition.evaluate(trigger) {
                tracing::debug!(
                    rule_id = %rule.id,
                    %category,
                    priority = rule.priority,
                    "audit rule matched"
                );
                return Some(rule);
            }
        }
        tracing::debug!(%category, "no audit rule matched, auto-approve");
        None
    }
}
