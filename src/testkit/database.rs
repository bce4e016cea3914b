//! `InMemoryDatabase`: a `DashMap`-keyed, append-ordered store, following the
//! shape of the kernel's task registry — one map per aggregate, guarded only
//! by the map's own sharding.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use wayrunner_core_types::{ArtifactId, OrganizationId, StepId, TaskId};

use crate::errors::{EngineError, EngineResult};
use crate::model::{Artifact, ArtifactType, Step, Task, TaskStatus};
use crate::ports::{Database, NewTask, StepChanges, TaskChanges};

#[derive(Default)]
pub struct InMemoryDatabase {
    tasks: DashMap<TaskId, Task>,
    steps: DashMap<StepId, Step>,
    artifacts: DashMap<(TaskId, StepId, ArtifactType), Artifact>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_artifact(&self, artifact: Artifact) {
        self.artifacts
            .insert((artifact.task_id.clone(), artifact.step_id.clone(), artifact.artifact_type), artifact);
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn create_task(&self, new_task: NewTask) -> EngineResult<Task> {
        let now = Utc::now();
        let task = Task {
            task_id: TaskId::new(),
            organization_id: new_task.organization_id,
            workflow_run_id: new_task.workflow_run_id,
            url: new_task.url,
            title: new_task.title,
            navigation_goal: new_task.navigation_goal,
            data_extraction_goal: new_task.data_extraction_goal,
            navigation_payload: new_task.navigation_payload,
            extracted_information_schema: new_task.extracted_information_schema,
            error_code_mapping: new_task.error_code_mapping,
            proxy_location: new_task.proxy_location,
            webhook_callback_url: new_task.webhook_callback_url,
            status: TaskStatus::Created,
            extracted_information: None,
            failure_reason: None,
            errors: Vec::new(),
            created_at: now,
            modified_at: now,
        };
        self.tasks.insert(task.task_id.clone(), task.clone());
        Ok(task)
    }

    async fn update_task(&self, task_id: &TaskId, organization_id: &OrganizationId, changes: TaskChanges) -> EngineResult<Task> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| EngineError::task_not_found(task_id))?;
        if &entry.organization_id != organization_id {
            return Err(EngineError::task_not_found(task_id));
        }
        if let Some(status) = changes.status {
            entry.status = status;
        }
        if changes.extracted_information.is_some() {
            entry.extracted_information = changes.extracted_information;
        }
        if let Some(reason) = changes.failure_reason {
            entry.failure_reason = Some(reason);
        }
        if let Some(errors) = changes.errors {
            entry.errors = errors;
        }
        entry.modified_at = Utc::now();
        Ok(entry.clone())
    }

    async fn get_task(&self, task_id: &TaskId, organization_id: &OrganizationId) -> EngineResult<Option<Task>> {
        Ok(self
            .tasks
            .get(task_id)
            .filter(|task| &task.organization_id == organization_id)
            .map(|task| task.clone()))
    }

    async fn get_task_steps(&self, task_id: &TaskId, organization_id: &OrganizationId) -> EngineResult<Vec<Step>> {
        let mut steps: Vec<Step> = self
            .steps
            .iter()
            .filter(|entry| &entry.task_id == task_id && &entry.organization_id == organization_id)
            .map(|entry| entry.clone())
            .collect();
        steps.sort_by_key(|step| (step.order, step.retry_index));
        Ok(steps)
    }

    async fn create_step(&self, task_id: &TaskId, organization_id: &OrganizationId, order: u32, retry_index: u32) -> EngineResult<Step> {
        let step = Step::new(task_id.clone(), organization_id.clone(), order, retry_index);
        self.steps.insert(step.step_id.clone(), step.clone());
        Ok(step)
    }

    async fn update_step(
        &self,
        step_id: &StepId,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        changes: StepChanges,
    ) -> EngineResult<Step> {
        let mut entry = self
            .steps
            .get_mut(step_id)
            .ok_or_else(|| EngineError::internal(format!("step {step_id} not found")))?;
        if &entry.task_id != task_id || &entry.organization_id != organization_id {
            return Err(EngineError::internal(format!("step {step_id} does not belong to task {task_id}")));
        }
        if let Some(status) = changes.status {
            entry.status = status;
        }
        if let Some(output) = changes.output {
            entry.output = Some(output);
        }
        if let Some(is_last) = changes.is_last {
            entry.is_last = is_last;
        }
        if let Some(retry_index) = changes.retry_index {
            entry.retry_index = retry_index;
        }
        entry.modified_at = Utc::now();
        Ok(entry.clone())
    }

    async fn get_artifact(
        &self,
        task_id: &TaskId,
        step_id: &StepId,
        organization_id: &OrganizationId,
        artifact_type: ArtifactType,
    ) -> EngineResult<Option<Artifact>> {
        Ok(self
            .artifacts
            .get(&(task_id.clone(), step_id.clone(), artifact_type))
            .filter(|artifact| &artifact.organization_id == organization_id)
            .map(|artifact| artifact.clone()))
    }
}
