//! Builds the scraped snapshot and rendered "extract-action" prompt that
//! `StepExecutor` hands to the LLM.

use std::sync::Arc;

use tracing::debug;

use wayrunner_core_types::OrganizationId;

use crate::errors::EngineResult;
use crate::model::{ArtifactType, ScrapedPage, Step, Task};
use crate::ports::{ArtifactData, BrowserState, Database, PromptEngine, PromptVars, Scraper};

use super::artifact_sink::ArtifactSink;

pub struct PromptBuilder {
    scraper: Arc<dyn Scraper>,
    prompt_engine: Arc<dyn PromptEngine>,
    database: Arc<dyn Database>,
    artifact_sink: Arc<ArtifactSink>,
    prompt_action_history_window: usize,
}

impl PromptBuilder {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        prompt_engine: Arc<dyn PromptEngine>,
        database: Arc<dyn Database>,
        artifact_sink: Arc<ArtifactSink>,
        prompt_action_history_window: usize,
    ) -> Self {
        Self {
            scraper,
            prompt_engine,
            database,
            artifact_sink,
            prompt_action_history_window,
        }
    }

    pub async fn build(&self, task: &Task, step: &Step, browser_state: &BrowserState) -> EngineResult<(ScrapedPage, String)> {
        let page = self
            .scraper
            .scrape(browser_state, task.url.as_deref())
            .await?;

        self.artifact_sink
            .create_artifact(
                &task.task_id,
                &step.step_id,
                &task.organization_id,
                ArtifactType::HtmlScrape,
                ArtifactData::Bytes(page.html.clone().into_bytes()),
            )
            .await;

        let action_history = self.action_history_json(task, &task.organization_id).await?;

        let prompt = self.prompt_engine.load_prompt(
            "extract-action",
            PromptVars {
                navigation_goal: task.navigation_goal.clone(),
                navigation_payload_str: serde_json::to_string(&task.navigation_payload)?,
                url: task.url.clone().unwrap_or_default(),
                elements: page.element_tree_trimmed.clone(),
                data_extraction_goal: task.data_extraction_goal.clone(),
                action_history,
                error_code_mapping_str: task
                    .error_code_mapping
                    .as_ref()
                    .map(|mapping| serde_json::to_string(mapping))
                    .transpose()?,
                utc_datetime: chrono::Utc::now(),
            },
        )?;

        self.persist_element_artifacts(task, step, &page).await;

        debug!(task_id = %task.task_id, step_id = %step.step_id, "prompt built");
        Ok((page, prompt))
    }

    /// Last `PROMPT_ACTION_HISTORY_WINDOW` prior Steps' completed action
    /// results, flattened into one chronological JSON array.
    async fn action_history_json(&self, task: &Task, organization_id: &OrganizationId) -> EngineResult<String> {
        let mut steps = self.database.get_task_steps(&task.task_id, organization_id).await?;
        steps.sort_by_key(|s| (s.order, s.retry_index));

        let window_start = steps.len().saturating_sub(self.prompt_action_history_window);
        let mut flattened = Vec::new();
        for step in &steps[window_start..] {
            let Some(output) = &step.output else { continue };
            for result in &output.action_results {
                flattened.push(serde_json::to_value(result)?);
            }
        }
        Ok(serde_json::to_string(&flattened)?)
    }

    async fn persist_element_artifacts(&self, task: &Task, step: &Step, page: &ScrapedPage) {
        let id_to_xpath_bytes = serde_json::to_vec(&page.id_to_xpath).unwrap_or_default();
        self.artifact_sink
            .create_artifact(
                &task.task_id,
                &step.step_id,
                &task.organization_id,
                ArtifactType::VisibleElementsIdXpathMap,
                ArtifactData::Bytes(id_to_xpath_bytes),
            )
            .await;

        let tree_bytes = serde_json::to_vec(&page.element_tree).unwrap_or_default();
        self.artifact_sink
            .create_artifact(
                &task.task_id,
                &step.step_id,
                &task.organization_id,
                ArtifactType::VisibleElementsTree,
                ArtifactData::Bytes(tree_bytes),
            )
            .await;

        let trimmed_bytes = serde_json::to_vec(&page.element_tree_trimmed).unwrap_or_default();
        self.artifact_sink
            .create_artifact(
                &task.task_id,
                &step.step_id,
                &task.organization_id,
                ArtifactType::VisibleElementsTreeTrimmed,
                ArtifactData::Bytes(trimmed_bytes),
            )
            .await;
    }
}
