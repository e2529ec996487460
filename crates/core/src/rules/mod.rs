//! Audit rule configuration and matching.
//!
//! Rules map a trigger condition to an ordered sequence of approval step
//! templates. They are authored as JSON, parsed once at load time, and
//! matched against trigger data in priority order.
//!
//! # Modules
//!
//! - `types` - Audit categories and trigger data
//! - `condition` - The closed predicate AST and its evaluation
//! - `catalog` - Rule definitions, validation, and the loaded catalog
//! - `matcher` - Priority-ordered rule matching
//! - `error` - Rule configuration errors

pub mod catalog;
pub mod condition;
pub mod error;
pub mod matcher;
pub mod types;

#[cfg(test)]
mod matcher_props;

pub use catalog::{ApproverSpec, AuditRule, RuleCatalog, RuleDef, StepTemplate, StepTemplateDef};
pub use condition::{CompareOp, Condition};
pub use error::RuleError;
pub use matcher::RuleMatcher;
pub use types::{AuditCategory, TriggerData, TriggerValue};
