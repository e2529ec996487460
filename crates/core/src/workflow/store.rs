//! Instance storage and per-instance write serialization.
//!
//! All mutation of a workflow instance goes through [`WorkflowStore::update`],
//! which runs the caller's transition under that instance's lock. Concurrent
//! decisions on the same instance therefore serialize; the loser of a race
//! re-reads state the winner already changed and fails its precondition
//! checks instead of double-applying.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use acumen_shared::types::WorkflowInstanceId;

use super::error::WorkflowError;
use super::types::{
    InstanceStatus, OverdueStep, StepDecision, StepRecord, WorkflowInstance, WorkflowStatusView,
};

/// Storage seam for workflow instances.
pub trait WorkflowStore: Send + Sync {
    /// Persists a freshly created instance with its steps, atomically.
    ///
    /// # Errors
    ///
    /// `WorkflowError::DuplicateInstance` if the id is already present.
    fn insert(
        &self,
        instance: WorkflowInstance,
        steps: Vec<StepRecord>,
    ) -> Result<(), WorkflowError>;

    /// Runs `transition` against the instance under its write lock.
    ///
    /// The transition sees current state and its changes commit iff it
    /// returns `Ok`; on `Err` the instance is left as the transition left
    /// it, so transitions must not mutate before their preconditions pass.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InstanceNotFound`, or whatever `transition` returns.
    fn update<T>(
        &self,
        id: WorkflowInstanceId,
        transition: impl FnOnce(&mut WorkflowInstance, &mut [StepRecord]) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError>
    where
        Self: Sized;

    /// Reads a consistent snapshot of an instance and its steps.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InstanceNotFound`.
    fn view(&self, id: WorkflowInstanceId) -> Result<WorkflowStatusView, WorkflowError>;

    /// Pending steps of in-review instances past their expected due time.
    fn overdue(&self, now: DateTime<Utc>) -> Vec<OverdueStep>;
}

struct InstanceCell {
    instance: WorkflowInstance,
    steps: Vec<StepRecord>,
}

/// In-memory store: one lock per instance, lookup map shared.
#[derive(Default)]
pub struct MemoryStore {
    cells: DashMap<WorkflowInstanceId, Arc<Mutex<InstanceCell>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true when no instances are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn cell(&self, id: WorkflowInstanceId) -> Result<Arc<Mutex<InstanceCell>>, WorkflowError> {
        self.cells
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(WorkflowError::InstanceNotFound(id))
    }
}

impl WorkflowStore for MemoryStore {
    fn insert(
        &self,
        instance: WorkflowInstance,
        steps: Vec<StepRecord>,
    ) -> Result<(), WorkflowError> {
        match self.cells.entry(instance.id) {
            Entry::Occupied(_) => Err(WorkflowError::DuplicateInstance(instance.id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(InstanceCell { instance, steps })));
                Ok(())
            }
        }
    }

    fn update<T>(
        &self,
        id: WorkflowInstanceId,
        transition: impl FnOnce(&mut WorkflowInstance, &mut [StepRecord]) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        // Clone the Arc out first so the map shard is not held across the
        // instance lock.
        let cell = self.cell(id)?;
        let mut guard = cell.lock();
        let InstanceCell { instance, steps } = &mut *guard;
        transition(instance, steps)
    }

    fn view(&self, id: WorkflowInstanceId) -> Result<WorkflowStatusView, WorkflowError> {
        let cell = self.cell(id)?;
        let guard = cell.lock();
        let current_approver = (guard.instance.status == InstanceStatus::InReview)
            .then(|| {
                guard
                    .steps
                    .iter()
                    .find(|s| s.step_number == guard.instance.current_step)
                    .map(|s| s.approver)
            })
            .flatten();
        Ok(WorkflowStatusView {
            instance: guard.instance.clone(),
            current_approver,
            steps: guard.steps.clone(),
        })
    }

    fn overdue(&self, now: DateTime<Utc>) -> Vec<OverdueStep> {
        let mut found = Vec::new();
        for entry in &self.cells {
            let guard = entry.value().lock();
            if guard.instance.status != InstanceStatus::InReview {
                continue;
            }
            for step in &guard.steps {
                if step.decision == StepDecision::Pending && step.expected_due_at < now {
                    found.push(OverdueStep {
                        instance_id: guard.instance.id,
                        serial_no: guard.instance.serial_no.clone(),
                        step: step.clone(),
                    });
                }
            }
        }
        found
    }
}
