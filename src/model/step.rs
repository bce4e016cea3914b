use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayrunner_core_types::{OrganizationId, StepId, TaskId};

use super::action::{Action, ActionResult, ActionType};
use super::task::UserDefinedError;
use crate::errors::{EngineError, EngineResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// The persisted step output: actions, action_results, errors, and the
/// eagerly-populated `actions_and_results` pairing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentStepOutput {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub action_results: Vec<ActionResult>,
    #[serde(default)]
    pub errors: Vec<UserDefinedError>,
    #[serde(default)]
    pub actions_and_results: Vec<(Action, Vec<ActionResult>)>,
}

/// Working aggregate across a step. Fields are populated progressively so
/// that a crash mid-step still leaves a faithful record of what was
/// attempted.
#[derive(Clone, Debug, Default)]
pub struct DetailedAgentStepOutput {
    pub scraped_page: Option<super::scrape::ScrapedPage>,
    pub extract_action_prompt: Option<String>,
    pub llm_response: Option<serde_json::Value>,
    pub actions: Option<Vec<Action>>,
    pub action_results: Option<Vec<ActionResult>>,
    pub actions_and_results: Option<Vec<(Action, Vec<ActionResult>)>>,
}

impl DetailedAgentStepOutput {
    pub fn to_agent_step_output(&self) -> AgentStepOutput {
        AgentStepOutput {
            actions: self.actions.clone().unwrap_or_default(),
            action_results: self.action_results.clone().unwrap_or_default(),
            errors: self.extract_errors(),
            actions_and_results: self.actions_and_results.clone().unwrap_or_default(),
        }
    }

    /// `UserDefinedError` entries surfaced by actions in this step (an action
    /// may carry a reasoning/data payload the policy layer promotes into a
    /// user-defined error; currently none of the built-in action variants do,
    /// so this is always empty, kept as a named extension point).
    pub fn extract_errors(&self) -> Vec<UserDefinedError> {
        Vec::new()
    }
}

/// One build/act/judge cycle of a Task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    pub step_id: StepId,
    pub task_id: TaskId,
    pub organization_id: OrganizationId,
    pub order: u32,
    pub retry_index: u32,
    pub is_last: bool,
    pub status: StepStatus,
    pub output: Option<AgentStepOutput>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Step {
    pub fn new(task_id: TaskId, organization_id: OrganizationId, order: u32, retry_index: u32) -> Self {
        let now = Utc::now();
        Self {
            step_id: StepId::new(),
            task_id,
            organization_id,
            order,
            retry_index,
            is_last: false,
            status: StepStatus::Created,
            output: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Before writing a status transition, check it respects the invariant
    /// that a terminal step is frozen. A no-op update (same status) is
    /// always allowed.
    pub fn validate_status_update(&self, new_status: Option<StepStatus>) -> EngineResult<()> {
        if let Some(new_status) = new_status {
            if self.status.is_terminal() && new_status != self.status {
                return Err(EngineError::invalid_step_transition(
                    &self.step_id,
                    self.status,
                    new_status,
                ));
            }
        }
        Ok(())
    }

    /// The step contains a successful `COMPLETE` action.
    pub fn is_goal_achieved(&self) -> bool {
        let Some(output) = &self.output else {
            return false;
        };
        output
            .actions_and_results
            .iter()
            .any(|(action, results)| {
                action.action_type() == ActionType::Complete
                    && results.iter().any(|r| r.success)
            })
    }

    /// The step contains a `TERMINATE` action.
    pub fn is_terminated(&self) -> bool {
        let Some(output) = &self.output else {
            return false;
        };
        output
            .actions_and_results
            .iter()
            .any(|(action, _)| action.action_type() == ActionType::Terminate)
    }
}
