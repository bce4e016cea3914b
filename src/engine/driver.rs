//! `TaskDriver`: the outer loop. Validates, invokes `StepExecutor`, applies
//! `StepPolicy`, and loops or hands the next step back to the caller. The
//! original's self-recursion on retry/advance is an explicit loop here.

use std::sync::Arc;

use tracing::info;

use wayrunner_core_types::TaskId;

use crate::errors::{EngineError, EngineResult};
use crate::model::{
    DetailedAgentStepOutput, ExecutionContext, Organization, Step, StepStatus, Task, TaskBlock, TaskStatus, WorkflowRef,
};
use crate::ports::{ArtifactData, BrowserManager, BrowserState, Database, NewTask, StepChanges, TaskChanges, WorkflowRunContext};

use super::artifact_sink::ArtifactSink;
use super::executor::StepExecutor;
use super::policy::{StepOutcome, StepPolicy};
use super::recorder::StepRecorder;
use super::responder::Responder;

pub struct TaskDriver {
    database: Arc<dyn Database>,
    browser_manager: Arc<dyn BrowserManager>,
    artifact_sink: Arc<ArtifactSink>,
    recorder: Arc<StepRecorder>,
    executor: Arc<StepExecutor>,
    policy: Arc<StepPolicy>,
    responder: Arc<Responder>,
    execute_all_steps: bool,
}

impl TaskDriver {
    pub fn new(
        database: Arc<dyn Database>,
        browser_manager: Arc<dyn BrowserManager>,
        artifact_sink: Arc<ArtifactSink>,
        recorder: Arc<StepRecorder>,
        executor: Arc<StepExecutor>,
        policy: Arc<StepPolicy>,
        responder: Arc<Responder>,
        execute_all_steps: bool,
    ) -> Self {
        Self {
            database,
            browser_manager,
            artifact_sink,
            recorder,
            executor,
            policy,
            responder,
            execute_all_steps,
        }
    }

    /// Drives `step` to completion, looping across retries/advances until a
    /// terminal outcome or (when `execute_all_steps` is off) an `Advance` is
    /// reached. Returns the last executed step, its detailed output, and the
    /// next step to drive, if the caller must drive it itself.
    pub async fn execute_step(
        &self,
        organization: &Organization,
        task: Task,
        step: Step,
        context: &ExecutionContext,
        api_key: Option<&str>,
        workflow_run: bool,
        close_browser_on_completion: bool,
    ) -> EngineResult<(Step, DetailedAgentStepOutput, Option<Step>)> {
        let mut task = task;
        let mut step = step;

        loop {
            self.validate_step_execution(&task, &step).await?;

            let mut browser_state = self.acquire_browser_state(&task, workflow_run).await?;
            self.ensure_video_artifact(&task, &mut browser_state).await?;

            let (executed_step, detailed) = self.executor.agent_step(&task, &step, &mut browser_state, organization).await?;

            if let Some(output) = &executed_step.output {
                if !output.errors.is_empty() {
                    let mut errors = task.errors.clone();
                    errors.extend(output.errors.clone());
                    task = self
                        .recorder
                        .update_task(&task, &task.organization_id, TaskChanges::default().with_errors(errors))
                        .await?;
                }
            }

            let outcome = self
                .policy
                .resolve(&executed_step, &task, organization, context.max_steps_override)
                .await?;

            match outcome {
                StepOutcome::TaskCompleted { last_step }
                | StepOutcome::TaskTerminated { last_step }
                | StepOutcome::TaskFailed { last_step } => {
                    self.responder
                        .finalize(&task.task_id, &task.organization_id, api_key, close_browser_on_completion)
                        .await?;
                    return Ok((last_step, detailed, None));
                }
                StepOutcome::Retry { next_step } => {
                    info!(task_id = %task.task_id, order = next_step.order, retry_index = next_step.retry_index, "retrying step");
                    task = self.refresh_task(&task.task_id, &task.organization_id).await?;
                    step = next_step;
                }
                StepOutcome::Advance { next_step } => {
                    if self.execute_all_steps {
                        task = self.refresh_task(&task.task_id, &task.organization_id).await?;
                        step = next_step;
                    } else {
                        return Ok((executed_step, detailed, Some(next_step)));
                    }
                }
            }
        }
    }

    /// `validate_step_execution`: task must be `running`, step must be
    /// `created` or `failed`, and no other step of this task may be
    /// `running`.
    async fn validate_step_execution(&self, task: &Task, step: &Step) -> EngineResult<()> {
        if task.status != TaskStatus::Running {
            return Err(EngineError::invalid_task_status(&task.task_id, task.status));
        }
        if !matches!(step.status, StepStatus::Created | StepStatus::Failed) {
            return Err(EngineError::invalid_step_status(&step.step_id, step.status));
        }

        let siblings = self.database.get_task_steps(&task.task_id, &task.organization_id).await?;
        if siblings
            .iter()
            .any(|s| s.step_id != step.step_id && s.status == StepStatus::Running)
        {
            return Err(EngineError::another_step_running(&task.task_id));
        }
        Ok(())
    }

    async fn acquire_browser_state(&self, task: &Task, workflow_run: bool) -> EngineResult<BrowserState> {
        if workflow_run {
            let workflow_run_id = task
                .workflow_run_id
                .clone()
                .ok_or_else(|| EngineError::internal("workflow_run requested but task has no workflow_run_id"))?;
            let browser_state = self
                .browser_manager
                .get_or_create_for_workflow_run(&workflow_run_id, task.url.as_deref())
                .await?;

            if task.url.is_none() {
                let current_url = browser_state.page.as_ref().map(|p| p.url());
                let is_blank = match current_url.as_deref() {
                    Some(url) => url == "about:blank",
                    None => true,
                };
                if is_blank {
                    return Err(EngineError::invalid_workflow_task_url_state(&workflow_run_id));
                }
            }
            Ok(browser_state)
        } else {
            self.browser_manager.get_or_create_for_task(task).await
        }
    }

    async fn ensure_video_artifact(&self, task: &Task, browser_state: &mut BrowserState) -> EngineResult<()> {
        if browser_state.browser_artifacts.video_artifact_id.is_some() {
            return Ok(());
        }

        let placeholder_step_id = wayrunner_core_types::StepId::new();
        if let Some(artifact_id) = self
            .artifact_sink
            .create_artifact(
                &task.task_id,
                &placeholder_step_id,
                &task.organization_id,
                crate::model::ArtifactType::Recording,
                ArtifactData::Bytes(Vec::new()),
            )
            .await
        {
            self.browser_manager.set_video_artifact_for_task(&task.task_id, artifact_id.clone()).await?;
            browser_state.browser_artifacts.video_artifact_id = Some(artifact_id);
        }
        Ok(())
    }

    async fn refresh_task(&self, task_id: &TaskId, organization_id: &wayrunner_core_types::OrganizationId) -> EngineResult<Task> {
        self.database
            .get_task(task_id, organization_id)
            .await?
            .ok_or_else(|| EngineError::task_not_found(task_id))
    }

    /// Constructs the initial Task+Step from a workflow's TaskBlock: resolves
    /// `navigation_payload` from named parameters, inherits the URL from the
    /// current browser page when the block has none, creates the task as
    /// `running`, and creates step `(order=0, retry=0)`.
    pub async fn begin_workflow_task(
        &self,
        workflow: &WorkflowRef,
        block: &TaskBlock,
        workflow_run_context: &dyn WorkflowRunContext,
        workflow_run_id: wayrunner_core_types::WorkflowRunId,
    ) -> EngineResult<(Task, Step)> {
        let mut navigation_payload = serde_json::Map::new();
        for key in &block.parameter_keys {
            if let Some(value) = workflow_run_context.get_value(key) {
                navigation_payload.insert(key.clone(), value);
            }
        }

        let url = match &block.url {
            Some(url) => Some(url.clone()),
            None => {
                let browser_state = self
                    .browser_manager
                    .get_or_create_for_workflow_run(&workflow_run_id, None)
                    .await?;
                browser_state.page.as_ref().map(|p| p.url())
            }
        };

        let new_task = NewTask {
            url,
            title: block.title.clone(),
            webhook_callback_url: None,
            navigation_goal: block.navigation_goal.clone(),
            data_extraction_goal: block.data_extraction_goal.clone(),
            navigation_payload: serde_json::Value::Object(navigation_payload),
            organization_id: workflow.organization_id.clone(),
            proxy_location: workflow.proxy_location.clone(),
            extracted_information_schema: block.data_schema.clone(),
            error_code_mapping: block.error_code_mapping.clone(),
            workflow_run_id: Some(workflow_run_id),
        };

        let task = self.database.create_task(new_task).await?;
        let task = self
            .recorder
            .update_task(&task, &task.organization_id, TaskChanges::status(TaskStatus::Running))
            .await?;
        let step = self.recorder.create_step(&task.task_id, &task.organization_id, 0, 0).await?;

        Ok((task, step))
    }
}
