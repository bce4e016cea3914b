//! Collaborator ports: one `async_trait` per external capability the engine
//! consumes. Production adapters and the `testkit` in-memory fakes both
//! satisfy these traits; the core never depends on a concrete one.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use wayrunner_core_types::{ArtifactId, OrganizationId, StepId, TaskId, WorkflowRunId};

use crate::errors::EngineResult;
use crate::model::{Action, ActionResult, Artifact, ArtifactType, ScrapedPage, Step, StepStatus, Task, TaskStatus};

/// Fields a `Database::create_task` call may set; mirrors the keyword
/// arguments `app.DATABASE.create_task` accepts upstream.
#[derive(Clone, Debug, Default)]
pub struct NewTask {
    pub url: Option<String>,
    pub title: Option<String>,
    pub webhook_callback_url: Option<String>,
    pub navigation_goal: Option<String>,
    pub data_extraction_goal: Option<String>,
    pub navigation_payload: Value,
    pub organization_id: OrganizationId,
    pub proxy_location: Option<String>,
    pub extracted_information_schema: Option<Value>,
    pub error_code_mapping: Option<std::collections::HashMap<String, String>>,
    pub workflow_run_id: Option<WorkflowRunId>,
}

/// Only-the-changing-fields update for `Database::update_task`.
#[derive(Clone, Debug, Default)]
pub struct TaskChanges {
    pub status: Option<TaskStatus>,
    pub extracted_information: Option<Value>,
    pub failure_reason: Option<String>,
    pub errors: Option<Vec<crate::model::UserDefinedError>>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_extracted_information(mut self, value: Option<Value>) -> Self {
        self.extracted_information = value;
        self
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<crate::model::UserDefinedError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Only-the-changing-fields update for `Database::update_step`.
#[derive(Clone, Debug, Default)]
pub struct StepChanges {
    pub status: Option<StepStatus>,
    pub output: Option<crate::model::AgentStepOutput>,
    pub is_last: Option<bool>,
    pub retry_index: Option<u32>,
}

impl StepChanges {
    pub fn status(status: StepStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_last(mut self, is_last: bool) -> Self {
        self.is_last = Some(is_last);
        self
    }

    pub fn with_output(mut self, output: crate::model::AgentStepOutput) -> Self {
        self.output = Some(output);
        self
    }
}

#[async_trait]
pub trait Database: Send + Sync {
    async fn create_task(&self, new_task: NewTask) -> EngineResult<Task>;
    async fn update_task(
        &self,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        changes: TaskChanges,
    ) -> EngineResult<Task>;
    async fn get_task(&self, task_id: &TaskId, organization_id: &OrganizationId) -> EngineResult<Option<Task>>;
    async fn get_task_steps(&self, task_id: &TaskId, organization_id: &OrganizationId) -> EngineResult<Vec<Step>>;
    async fn create_step(
        &self,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        order: u32,
        retry_index: u32,
    ) -> EngineResult<Step>;
    async fn update_step(
        &self,
        step_id: &StepId,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        changes: StepChanges,
    ) -> EngineResult<Step>;
    async fn get_artifact(
        &self,
        task_id: &TaskId,
        step_id: &StepId,
        organization_id: &OrganizationId,
        artifact_type: ArtifactType,
    ) -> EngineResult<Option<Artifact>>;
}

/// A live page within a `BrowserState`.
#[async_trait]
pub trait Page: Send + Sync {
    fn url(&self) -> String;
    async fn content(&self) -> EngineResult<String>;
    async fn take_screenshot(&self, full_page: bool) -> EngineResult<Vec<u8>>;
}

#[derive(Clone, Debug, Default)]
pub struct BrowserArtifacts {
    pub video_artifact_id: Option<ArtifactId>,
    pub traces_dir: Option<String>,
}

/// The browser resource shared with the engine for the duration of a Task
/// (or, within a WorkflowRun, sequentially across its TaskBlocks).
#[derive(Clone)]
pub struct BrowserState {
    pub page: Option<Arc<dyn Page>>,
    pub browser_context: bool,
    pub browser_artifacts: BrowserArtifacts,
}

impl BrowserState {
    pub async fn get_or_create_page(&mut self) -> EngineResult<Arc<dyn Page>> {
        if let Some(page) = &self.page {
            return Ok(page.clone());
        }
        Err(crate::errors::EngineError::browser_state_missing_page())
    }
}

#[async_trait]
pub trait BrowserManager: Send + Sync {
    async fn get_or_create_for_task(&self, task: &Task) -> EngineResult<BrowserState>;
    async fn get_or_create_for_workflow_run(
        &self,
        workflow_run_id: &WorkflowRunId,
        url: Option<&str>,
    ) -> EngineResult<BrowserState>;
    async fn get_video_data(&self, task_id: &TaskId) -> EngineResult<Option<Vec<u8>>>;
    async fn get_har_data(&self, task_id: &TaskId) -> EngineResult<Option<Vec<u8>>>;
    async fn set_video_artifact_for_task(&self, task_id: &TaskId, artifact_id: ArtifactId) -> EngineResult<()>;
    async fn cleanup_for_task(
        &self,
        task_id: &TaskId,
        close_on_completion: bool,
    ) -> EngineResult<Option<BrowserState>>;
}

/// Payload for `ArtifactManager::create_artifact`: either raw bytes or a
/// filesystem path (used for the trace artifact).
#[derive(Clone, Debug)]
pub enum ArtifactData {
    Bytes(Vec<u8>),
    Path(String),
}

#[async_trait]
pub trait ArtifactManager: Send + Sync {
    async fn create_artifact(
        &self,
        task_id: &TaskId,
        step_id: &StepId,
        organization_id: &OrganizationId,
        artifact_type: ArtifactType,
        data: ArtifactData,
    ) -> EngineResult<ArtifactId>;
    async fn update_artifact_data(
        &self,
        artifact_id: &ArtifactId,
        organization_id: &OrganizationId,
        data: Vec<u8>,
    ) -> EngineResult<()>;
    async fn wait_for_upload(&self, task_id: &TaskId) -> EngineResult<()>;
    async fn get_share_link(&self, artifact: &Artifact) -> EngineResult<Option<String>>;
}

#[async_trait]
pub trait LlmHandler: Send + Sync {
    async fn call(&self, prompt: &str, step: &Step, screenshots: &[Vec<u8>]) -> EngineResult<Value>;
}

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, browser_state: &BrowserState, url: Option<&str>) -> EngineResult<ScrapedPage>;
}

/// Named template variables for `PromptEngine::load_prompt("extract-action", ...)`.
#[derive(Clone, Debug)]
pub struct PromptVars {
    pub navigation_goal: Option<String>,
    pub navigation_payload_str: String,
    pub url: String,
    pub elements: Value,
    pub data_extraction_goal: Option<String>,
    pub action_history: String,
    pub error_code_mapping_str: Option<String>,
    pub utc_datetime: chrono::DateTime<chrono::Utc>,
}

pub trait PromptEngine: Send + Sync {
    fn load_prompt(&self, name: &str, vars: PromptVars) -> EngineResult<String>;
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(
        &self,
        page: &ScrapedPage,
        task: &Task,
        step: &Step,
        browser_state: &BrowserState,
        action: &Action,
    ) -> EngineResult<Vec<ActionResult>>;
}

#[derive(Clone, Debug)]
pub struct WebhookHeaders {
    pub timestamp: String,
    pub signature: String,
}

#[derive(Clone, Debug)]
pub struct WebhookResponse {
    pub status: u16,
    pub ok: bool,
    pub body: String,
}

#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, url: &str, body: &str, headers: WebhookHeaders) -> EngineResult<WebhookResponse>;
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn capture(&self, event: &str, properties: Value) -> EngineResult<()>;
}

/// Resolves named workflow parameters for `TaskDriver::begin_workflow_task`.
pub trait WorkflowRunContext: Send + Sync {
    fn get_value(&self, key: &str) -> Option<Value>;
}
