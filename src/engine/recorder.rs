//! Persists Step/Task mutations through `Database`, validating every
//! transition before it reaches storage and logging a structured diff of
//! only the fields that actually changed.

use std::sync::Arc;

use tracing::info;

use wayrunner_core_types::{OrganizationId, TaskId};

use crate::errors::EngineResult;
use crate::model::{Step, Task};
use crate::ports::{Database, StepChanges, TaskChanges};

pub struct StepRecorder {
    database: Arc<dyn Database>,
}

impl StepRecorder {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    pub async fn update_step(
        &self,
        step: &Step,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        changes: StepChanges,
    ) -> EngineResult<Step> {
        step.validate_status_update(changes.status)?;

        if let Some(status) = changes.status {
            if status != step.status {
                info!(
                    step_id = %step.step_id,
                    field = "status",
                    old = ?step.status,
                    new = ?status,
                    "step field changed"
                );
            }
        }
        if changes.is_last == Some(true) && !step.is_last {
            info!(step_id = %step.step_id, field = "is_last", old = false, new = true, "step field changed");
        }

        self.database
            .update_step(&step.step_id, task_id, organization_id, changes)
            .await
    }

    pub async fn update_task(
        &self,
        task: &Task,
        organization_id: &OrganizationId,
        changes: TaskChanges,
    ) -> EngineResult<Task> {
        task.validate_status_update(changes.status)?;

        if let Some(status) = changes.status {
            if status != task.status {
                info!(
                    task_id = %task.task_id,
                    field = "status",
                    old = ?task.status,
                    new = ?status,
                    "task field changed"
                );
            }
        }

        self.database.update_task(&task.task_id, organization_id, changes).await
    }

    pub async fn create_step(
        &self,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        order: u32,
        retry_index: u32,
    ) -> EngineResult<Step> {
        self.database.create_step(task_id, organization_id, order, retry_index).await
    }
}
