//! `StepPolicy`: decides what a finished step implies for its task — retry,
//! advance, or one of the three terminal outcomes.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::errors::EngineResult;
use crate::model::{Organization, Step, StepStatus, Task, TaskStatus};
use crate::ports::{Database, StepChanges, TaskChanges};

use super::recorder::StepRecorder;

/// What a finished step implies for its task.
pub enum StepOutcome {
    Retry { next_step: Step },
    Advance { next_step: Step },
    TaskCompleted { last_step: Step },
    TaskTerminated { last_step: Step },
    TaskFailed { last_step: Step },
}

pub struct StepPolicy {
    database: Arc<dyn Database>,
    recorder: Arc<StepRecorder>,
    max_retries_per_step: u32,
    max_steps_per_run: u32,
    long_running_task_warning_ratio: f64,
}

impl StepPolicy {
    pub fn new(
        database: Arc<dyn Database>,
        recorder: Arc<StepRecorder>,
        max_retries_per_step: u32,
        max_steps_per_run: u32,
        long_running_task_warning_ratio: f64,
    ) -> Self {
        Self {
            database,
            recorder,
            max_retries_per_step,
            max_steps_per_run,
            long_running_task_warning_ratio,
        }
    }

    pub async fn resolve(
        &self,
        step: &Step,
        task: &Task,
        organization: &Organization,
        max_steps_override: Option<u32>,
    ) -> EngineResult<StepOutcome> {
        if step.status == StepStatus::Failed {
            if step.retry_index < self.max_retries_per_step {
                let next_step = self
                    .database
                    .create_step(&task.task_id, &task.organization_id, step.order, step.retry_index + 1)
                    .await?;
                return Ok(StepOutcome::Retry { next_step });
            }

            let reason = format!("Max retries per step ({}) exceeded", self.max_retries_per_step);
            self.database
                .update_task(
                    &task.task_id,
                    &task.organization_id,
                    TaskChanges::status(TaskStatus::Failed).with_failure_reason(reason),
                )
                .await?;
            return Ok(StepOutcome::TaskFailed { last_step: step.clone() });
        }

        debug_assert_eq!(step.status, StepStatus::Completed);

        if step.is_goal_achieved() {
            let last_step = self.mark_last(step, task).await?;
            let extracted_information = self.extracted_information_for_task(task).await?;
            self.database
                .update_task(
                    &task.task_id,
                    &task.organization_id,
                    TaskChanges::status(TaskStatus::Completed).with_extracted_information(extracted_information),
                )
                .await?;
            return Ok(StepOutcome::TaskCompleted { last_step });
        }

        if step.is_terminated() {
            let last_step = self.mark_last(step, task).await?;
            let reason = self.failure_reason_for_task(task).await?;
            let mut changes = TaskChanges::status(TaskStatus::Terminated);
            if let Some(reason) = reason {
                changes = changes.with_failure_reason(reason);
            }
            self.database.update_task(&task.task_id, &task.organization_id, changes).await?;
            return Ok(StepOutcome::TaskTerminated { last_step });
        }

        let effective_max = max_steps_override
            .or(organization.max_steps_per_run)
            .unwrap_or(self.max_steps_per_run);

        if step.order + 1 >= effective_max {
            let last_step = self.mark_last(step, task).await?;
            let reason = format!("Max steps per task ({effective_max}) exceeded");
            self.database
                .update_task(
                    &task.task_id,
                    &task.organization_id,
                    TaskChanges::status(TaskStatus::Failed).with_failure_reason(reason),
                )
                .await?;
            return Ok(StepOutcome::TaskFailed { last_step });
        }

        if effective_max > 0 {
            let warning_order = (effective_max as f64 * self.long_running_task_warning_ratio).floor() as u32;
            if warning_order > 0 && step.order == warning_order - 1 {
                warn!(task_id = %task.task_id, order = step.order, effective_max, "task is long-running");
            }
        }

        let next_step = self
            .database
            .create_step(&task.task_id, &task.organization_id, step.order + 1, 0)
            .await?;
        Ok(StepOutcome::Advance { next_step })
    }

    async fn mark_last(&self, step: &Step, task: &Task) -> EngineResult<Step> {
        self.recorder
            .update_step(step, &task.task_id, &task.organization_id, StepChanges::default().is_last(true))
            .await
    }

    /// Scan completed steps in reverse for the most recent successful
    /// `COMPLETE` action's `data`.
    async fn extracted_information_for_task(&self, task: &Task) -> EngineResult<Option<Value>> {
        let mut steps = self.database.get_task_steps(&task.task_id, &task.organization_id).await?;
        steps.sort_by_key(|s| (s.order, s.retry_index));

        for step in steps.iter().rev() {
            if step.status != StepStatus::Completed {
                continue;
            }
            let Some(output) = &step.output else { continue };
            for (action, results) in output.actions_and_results.iter() {
                if action.action_type() != crate::model::ActionType::Complete {
                    continue;
                }
                if let Some(result) = results.iter().find(|r| r.success) {
                    if let crate::model::Action::Complete { data, .. } = action {
                        return Ok(data.clone().or_else(|| result.data.clone()));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Scan completed steps in reverse for the most recent `TERMINATE`
    /// action's reasoning.
    async fn failure_reason_for_task(&self, task: &Task) -> EngineResult<Option<String>> {
        let mut steps = self.database.get_task_steps(&task.task_id, &task.organization_id).await?;
        steps.sort_by_key(|s| (s.order, s.retry_index));

        for step in steps.iter().rev() {
            if step.status != StepStatus::Completed {
                continue;
            }
            let Some(output) = &step.output else { continue };
            for (action, _) in output.actions_and_results.iter() {
                if let crate::model::Action::Terminate { reasoning } = action {
                    return Ok(reasoning.clone());
                }
            }
        }
        Ok(None)
    }
}
