//! Error handling module
//!
//! Every engine failure mode maps onto an existing `soulbase-errors` code —
//! see SPEC_FULL.md §4.8 for the full table. No new codes are invented.
#![allow(dead_code)]

use std::fmt;

use soulbase_errors::{
    code::{codes, ErrorCode},
    model::ErrorBuilder,
    model::ErrorObj,
    retry::RetryClass,
};

use wayrunner_core_types::{ArtifactId, StepId, TaskId, WorkflowRunId};

use crate::model::{StepStatus, TaskStatus};

/// Unified error type for the engine, wrapping `soulbase_errors::ErrorObj`.
#[derive(Debug, Clone)]
pub struct EngineError {
    inner: ErrorObj,
}

impl EngineError {
    fn build(code: ErrorCode, user_msg: impl Into<String>, dev_msg: impl Into<String>) -> Self {
        let error = ErrorBuilder::new(code)
            .user_msg(user_msg)
            .dev_msg(dev_msg)
            .build();
        Self { inner: error }
    }

    pub fn invalid_step_transition(step_id: &StepId, from: StepStatus, to: StepStatus) -> Self {
        Self::build(
            codes::SCHEMA_VALIDATION,
            "This step cannot be updated.",
            format!("step {step_id} invalid transition {from:?} -> {to:?}"),
        )
    }

    pub fn invalid_task_status(task_id: &TaskId, status: TaskStatus) -> Self {
        Self::build(
            codes::SCHEMA_VALIDATION,
            "This task cannot be executed.",
            format!("task {task_id} has status {status:?}, expected running"),
        )
    }

    pub fn invalid_step_status(step_id: &StepId, status: StepStatus) -> Self {
        Self::build(
            codes::SCHEMA_VALIDATION,
            "This step cannot be executed.",
            format!("step {step_id} has status {status:?}, expected created or failed"),
        )
    }

    pub fn another_step_running(task_id: &TaskId) -> Self {
        Self::build(
            codes::SCHEMA_VALIDATION,
            "Another step is already running for this task.",
            format!("task {task_id} already has a running step"),
        )
    }

    pub fn invalid_workflow_task_url_state(workflow_run_id: &WorkflowRunId) -> Self {
        Self::build(
            codes::SCHEMA_VALIDATION,
            "The workflow's current page has no URL to inherit.",
            format!("workflow run {workflow_run_id} page is about:blank and no url was provided"),
        )
    }

    pub fn task_not_found(task_id: &TaskId) -> Self {
        Self::build(
            codes::STORAGE_NOT_FOUND,
            "Task not found.",
            format!("task {task_id} does not exist"),
        )
    }

    pub fn artifact_not_found(artifact_id: &ArtifactId) -> Self {
        Self::build(
            codes::STORAGE_NOT_FOUND,
            "Artifact not found.",
            format!("artifact {artifact_id} does not exist"),
        )
    }

    pub fn browser_state_missing_page() -> Self {
        Self::build(
            codes::PROVIDER_UNAVAILABLE,
            "Browser page is unavailable.",
            "browser state has no page",
        )
    }

    pub fn missing_browser_state_page() -> Self {
        Self::build(
            codes::PROVIDER_UNAVAILABLE,
            "Browser page is unavailable.",
            "workflow run's browser state has no page",
        )
    }

    pub fn failed_to_send_webhook(task_id: &TaskId, cause: impl fmt::Display) -> Self {
        Self::build(
            codes::PROVIDER_UNAVAILABLE,
            "Failed to deliver the webhook.",
            format!("task {task_id} webhook transport error: {cause}"),
        )
    }

    pub fn llm_failure(message: impl Into<String>) -> Self {
        Self::build(codes::LLM_TIMEOUT, "The model did not respond.", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::build(codes::SCHEMA_VALIDATION, message.clone(), message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::build(codes::UNKNOWN_INTERNAL, "An internal error occurred.", message)
    }

    pub fn code(&self) -> ErrorCode {
        self.inner.code
    }

    pub fn user_message(&self) -> &str {
        &self.inner.message_user
    }

    pub fn http_status(&self) -> u16 {
        self.inner.http_status
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.inner.retryable, RetryClass::Transient)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.message_user)
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation(format!("invalid JSON: {err}"))
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        Self::validation(format!("invalid configuration: {err}"))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use wayrunner_core_types::TaskId;

    #[test]
    fn maps_invalid_task_status_to_schema_validation() {
        let err = EngineError::invalid_task_status(&TaskId::new(), TaskStatus::Completed);
        assert_eq!(err.code(), codes::SCHEMA_VALIDATION);
        assert!(!err.is_retryable());
    }

    #[test]
    fn maps_llm_failure_to_llm_timeout() {
        let err = EngineError::llm_failure("timed out after 30s");
        assert_eq!(err.code(), codes::LLM_TIMEOUT);
        assert!(err.is_retryable());
    }
}
