//! `StepExecutor`: the heart of one build/act/judge cycle. Builds the
//! prompt, queries the LLM, executes the resulting actions against the
//! browser, and classifies the outcome onto the Step.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::errors::EngineResult;
use crate::model::{
    parse_actions, Action, ActionResult, ActionType, ArtifactType, DetailedAgentStepOutput, Organization, Step,
    StepStatus, Task,
};
use crate::ports::{ArtifactData, ActionHandler, BrowserManager, BrowserState, LlmHandler, StepChanges};

use super::artifact_sink::ArtifactSink;
use super::prompt_builder::PromptBuilder;
use super::recorder::StepRecorder;

pub struct StepExecutor {
    prompt_builder: Arc<PromptBuilder>,
    llm: Arc<dyn LlmHandler>,
    action_handler: Arc<dyn ActionHandler>,
    artifact_sink: Arc<ArtifactSink>,
    browser_manager: Arc<dyn BrowserManager>,
    recorder: Arc<StepRecorder>,
}

impl StepExecutor {
    pub fn new(
        prompt_builder: Arc<PromptBuilder>,
        llm: Arc<dyn LlmHandler>,
        action_handler: Arc<dyn ActionHandler>,
        artifact_sink: Arc<ArtifactSink>,
        browser_manager: Arc<dyn BrowserManager>,
        recorder: Arc<StepRecorder>,
    ) -> Self {
        Self {
            prompt_builder,
            llm,
            action_handler,
            artifact_sink,
            browser_manager,
            recorder,
        }
    }

    pub async fn agent_step(
        &self,
        task: &Task,
        step: &Step,
        browser_state: &mut BrowserState,
        _organization: &Organization,
    ) -> EngineResult<(Step, DetailedAgentStepOutput)> {
        let mut detailed = DetailedAgentStepOutput::default();

        let step = match self.mark_running_and_run(task, step, browser_state, &mut detailed).await {
            Ok((running_step, failed_early)) => {
                if failed_early {
                    self.fail_step(&running_step, task, &detailed).await?
                } else {
                    self.recorder
                        .update_step(
                            &running_step,
                            &task.task_id,
                            &task.organization_id,
                            StepChanges::status(StepStatus::Completed).with_output(detailed.to_agent_step_output()),
                        )
                        .await?
                }
            }
            Err(err) => {
                error!(task_id = %task.task_id, step_id = %step.step_id, error = %err, "unhandled error in agent_step");
                self.fail_step(step, task, &detailed).await?
            }
        };

        Ok((step, detailed))
    }

    /// Transitions the step to `Running` and runs it. Both can fail; either
    /// failure is reported to the caller uniformly so `agent_step`'s single
    /// match arm is the only place a step ends up marked `Failed`.
    async fn mark_running_and_run(
        &self,
        task: &Task,
        step: &Step,
        browser_state: &mut BrowserState,
        detailed: &mut DetailedAgentStepOutput,
    ) -> EngineResult<(Step, bool)> {
        let running_step = self
            .recorder
            .update_step(step, &task.task_id, &task.organization_id, StepChanges::status(StepStatus::Running))
            .await?;
        let failed_early = self.run(task, &running_step, browser_state, detailed).await?;
        Ok((running_step, failed_early))
    }

    async fn fail_step(&self, step: &Step, task: &Task, detailed: &DetailedAgentStepOutput) -> EngineResult<Step> {
        self.recorder
            .update_step(
                step,
                &task.task_id,
                &task.organization_id,
                StepChanges::status(StepStatus::Failed).with_output(detailed.to_agent_step_output()),
            )
            .await
    }

    /// Returns `Ok(true)` if the step failed (and has already been recorded
    /// via `detailed`, to be persisted by the caller), `Ok(false)` on success.
    async fn run(
        &self,
        task: &Task,
        step: &Step,
        browser_state: &mut BrowserState,
        detailed: &mut DetailedAgentStepOutput,
    ) -> EngineResult<bool> {
        let (page, prompt) = self.prompt_builder.build(task, step, browser_state).await?;
        detailed.extract_action_prompt = Some(prompt.clone());
        detailed.scraped_page = Some(page.clone());

        let actions = if task.navigation_goal.is_some() {
            let response = self.llm.call(&prompt, step, &page.screenshots).await?;
            detailed.llm_response = Some(response.clone());
            parse_actions(&response)?
        } else {
            vec![Action::Complete {
                reasoning: Some("no navigation goal set for this task".to_string()),
                data: None,
            }]
        };

        if actions.is_empty() {
            detailed.actions = Some(Vec::new());
            detailed.action_results = Some(Vec::new());
            detailed.actions_and_results = Some(Vec::new());
            return Ok(true);
        }

        let actions = prune_waits(actions);
        detailed.actions = Some(actions.clone());

        let mut actions_and_results: Vec<(Action, Vec<ActionResult>)> =
            actions.iter().cloned().map(|action| (action, Vec::new())).collect();

        let mut seen_elements: HashSet<String> = HashSet::new();
        let mut failed = false;

        for (idx, action) in actions.iter().enumerate() {
            if let Some(element_id) = action.element_id() {
                if !seen_elements.insert(element_id.to_string()) {
                    warn!(task_id = %task.task_id, step_id = %step.step_id, element_id, "duplicate element target, stopping loop");
                    break;
                }
            }

            let mut results = self
                .action_handler
                .handle(&page, task, step, browser_state, action)
                .await?;
            for result in &mut results {
                result.step_order = step.order;
                result.step_retry_number = step.retry_index;
            }
            actions_and_results[idx].1 = results.clone();

            tokio::time::sleep(jitter()).await;
            self.capture_action_artifacts(task, step, browser_state).await;

            let Some(last) = results.last() else { continue };
            if !last.success {
                failed = true;
                break;
            }
            if last.javascript_triggered {
                break;
            }
        }

        let flat_results: Vec<ActionResult> = actions_and_results.iter().flat_map(|(_, r)| r.clone()).collect();
        detailed.action_results = Some(flat_results);
        detailed.actions_and_results = Some(actions_and_results);

        Ok(failed)
    }

    async fn capture_action_artifacts(&self, task: &Task, step: &Step, browser_state: &BrowserState) {
        if let Some(page) = &browser_state.page {
            if let Ok(screenshot) = page.take_screenshot(false).await {
                self.artifact_sink
                    .create_artifact(
                        &task.task_id,
                        &step.step_id,
                        &task.organization_id,
                        ArtifactType::ScreenshotAction,
                        ArtifactData::Bytes(screenshot),
                    )
                    .await;
            }
            if let Ok(html) = page.content().await {
                self.artifact_sink
                    .create_artifact(
                        &task.task_id,
                        &step.step_id,
                        &task.organization_id,
                        ArtifactType::HtmlAction,
                        ArtifactData::Bytes(html.into_bytes()),
                    )
                    .await;
            }
        }

        if let Some(video_artifact_id) = &browser_state.browser_artifacts.video_artifact_id {
            if let Ok(Some(video)) = self.browser_manager.get_video_data(&task.task_id).await {
                self.artifact_sink
                    .update_artifact_data(video_artifact_id, &task.organization_id, video)
                    .await;
            }
        }
    }
}

/// Drop all WAIT actions when mixed with at least one non-WAIT action.
fn prune_waits(actions: Vec<Action>) -> Vec<Action> {
    let has_wait = actions.iter().any(|a| a.action_type() == ActionType::Wait);
    let all_wait = actions.iter().all(|a| a.action_type() == ActionType::Wait);
    if actions.len() > 1 && has_wait && !all_wait {
        actions.into_iter().filter(|a| a.action_type() != ActionType::Wait).collect()
    } else {
        actions
    }
}

fn jitter() -> Duration {
    let millis = rand::thread_rng().gen_range(1000..=2000);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prunes_waits_when_mixed_with_real_actions() {
        let actions = vec![
            Action::Wait { reasoning: None },
            Action::Click {
                element_id: "e1".to_string(),
                reasoning: None,
            },
        ];
        let pruned = prune_waits(actions);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].action_type(), ActionType::Click);
    }

    #[test]
    fn preserves_wait_only_sequence() {
        let actions = vec![Action::Wait { reasoning: None }];
        let pruned = prune_waits(actions);
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].action_type(), ActionType::Wait);
    }
}
