use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use wayrunner_core_types::{OrganizationId, TaskId, WorkflowRunId};

use crate::errors::{EngineError, EngineResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Created,
    Running,
    Completed,
    Failed,
    Terminated,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Terminated
        )
    }
}

/// One user-supplied error surfaced by an action or the policy layer.
/// Accumulated into `task.errors` across steps; reported, never fatal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserDefinedError {
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Per-call ambient context, analogous to the original's `skyvern_context`.
/// Supplied by the caller of `TaskDriver::execute_step`, not stored on Task.
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    pub max_steps_override: Option<u32>,
    pub request_id: String,
}

/// The user request plus mutable state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub organization_id: OrganizationId,
    pub workflow_run_id: Option<WorkflowRunId>,

    pub url: Option<String>,
    pub title: Option<String>,
    pub navigation_goal: Option<String>,
    pub data_extraction_goal: Option<String>,
    #[serde(default)]
    pub navigation_payload: Value,
    pub extracted_information_schema: Option<Value>,
    pub error_code_mapping: Option<HashMap<String, String>>,
    pub proxy_location: Option<String>,
    pub webhook_callback_url: Option<String>,

    pub status: TaskStatus,
    pub extracted_information: Option<Value>,
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub errors: Vec<UserDefinedError>,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Task {
    /// Before writing a status transition, check it respects monotonicity:
    /// `created -> running -> {completed|failed|terminated}`, no transition
    /// out of a terminal state (a no-op update to the same status is
    /// allowed).
    pub fn validate_status_update(&self, new_status: Option<TaskStatus>) -> EngineResult<()> {
        if let Some(new_status) = new_status {
            if self.status.is_terminal() && new_status != self.status {
                return Err(EngineError::invalid_task_status(&self.task_id, self.status));
            }
        }
        Ok(())
    }
}

/// External projection of a Task: the CLI's `describe`/`status` output and,
/// with `navigation_payload` excluded, the webhook body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub url: Option<String>,
    pub navigation_goal: Option<String>,
    pub data_extraction_goal: Option<String>,
    pub navigation_payload: Value,
    pub extracted_information: Option<Value>,
    pub failure_reason: Option<String>,
    pub errors: Vec<UserDefinedError>,
    pub screenshot_url: Option<String>,
    pub recording_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl TaskResponse {
    pub fn from_task(task: &Task, screenshot_url: Option<String>, recording_url: Option<String>) -> Self {
        Self {
            task_id: task.task_id.clone(),
            status: task.status,
            url: task.url.clone(),
            navigation_goal: task.navigation_goal.clone(),
            data_extraction_goal: task.data_extraction_goal.clone(),
            navigation_payload: task.navigation_payload.clone(),
            extracted_information: task.extracted_information.clone(),
            failure_reason: task.failure_reason.clone(),
            errors: task.errors.clone(),
            screenshot_url,
            recording_url,
            created_at: task.created_at,
            modified_at: task.modified_at,
        }
    }

    /// The webhook wire body: this response serialized with
    /// `navigation_payload` excluded.
    pub fn to_webhook_body(&self) -> EngineResult<String> {
        let mut value = serde_json::to_value(self).map_err(EngineError::from)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("navigation_payload");
        }
        serde_json::to_string(&value).map_err(EngineError::from)
    }
}
