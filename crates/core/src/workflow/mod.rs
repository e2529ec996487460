//! Approval workflow execution.
//!
//! Instance lifecycle over the rule catalog: step materialization,
//! instance creation, the approve/reject/cancel state machine, and the
//! engine facade business modules call into.

pub mod directory;
pub mod engine;
pub mod error;
pub mod manager;
pub mod resolver;
pub mod state_machine;
pub mod store;
pub mod types;

#[cfg(test)]
mod resolver_props;
#[cfg(test)]
mod state_machine_props;

pub use directory::{RoleDirectory, UserDirectory};
pub use engine::{SubmitOutcome, WorkflowEngine};
pub use error::WorkflowError;
pub use manager::WorkflowInstanceManager;
pub use resolver::{StepDraft, StepResolver};
pub use state_machine::{ApprovalStateMachine, Transition};
pub use store::{MemoryStore, WorkflowStore};
pub use types::{
    Decision, DecideOutcome, InstanceStatus, OverdueStep, StepDecision, StepRecord, SubjectRef,
    TriggerEvent, WorkflowInstance, WorkflowStatusView,
};
