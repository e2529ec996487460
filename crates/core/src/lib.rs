//! Core business logic for Acumen.
//!
//! This crate contains the rule-driven approval workflow engine with ZERO
//! web or database dependencies. Business entities (contracts, quotes,
//! payments) live elsewhere; this crate owns audit rules, workflow
//! instances, and approval step records.
//!
//! # Modules
//!
//! - `rules` - Audit rule catalog, trigger predicates, and rule matching
//! - `workflow` - Workflow instances, step resolution, and the approval state machine
//! - `notify` - Best-effort notification dispatch for workflow transitions

pub mod notify;
pub mod rules;
pub mod workflow;
