use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use wayrunner_core_types::OrganizationId;

use crate::app_context::EngineContext;
use crate::config::EngineSettings;
use crate::model::{ExecutionContext, Organization, TaskResponse};
use crate::ports::{Database, NewTask};
use crate::testkit::{
    FakeArtifactManager, FakeBrowserManager, FakePromptEngine, FakeScraper, InMemoryDatabase, RecordingAnalyticsSink,
    ScriptedActionHandler, ScriptedLlmHandler,
};
use crate::webhook::HttpWebhookSender;

use super::args::Commands;

/// The on-disk shape of a task definition file passed to `run`/`validate`.
#[derive(Deserialize)]
struct TaskFile {
    organization_id: Option<String>,
    url: Option<String>,
    title: Option<String>,
    navigation_goal: Option<String>,
    data_extraction_goal: Option<String>,
    #[serde(default)]
    navigation_payload: Value,
    error_code_mapping: Option<std::collections::HashMap<String, String>>,
    proxy_location: Option<String>,
    webhook_callback_url: Option<String>,
    /// Canned LLM responses consumed one per step, in order.
    #[serde(default)]
    scripted_llm_responses: Vec<Value>,
    /// Canned action-handler result batches consumed one per action, in order.
    #[serde(default)]
    scripted_action_results: Vec<Vec<crate::model::ActionResult>>,
}

fn load_task_file(path: &Path) -> Result<TaskFile> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {} as a task definition", path.display()))
}

pub async fn dispatch(command: &Commands, config_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Validate { task_file } => {
            load_task_file(task_file)?;
            println!("{} is a valid task definition", task_file.display());
            Ok(())
        }
        Commands::Run { task_file, api_key } => run_task(task_file, api_key.as_deref(), config_path).await,
    }
}

async fn run_task(task_file: &Path, api_key: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let definition = load_task_file(task_file)?;
    let settings = EngineSettings::load(config_path).context("loading engine settings")?;

    let database = Arc::new(InMemoryDatabase::new());
    let browser_manager = Arc::new(FakeBrowserManager::new());
    let artifact_manager = Arc::new(FakeArtifactManager::new());
    let llm = Arc::new(ScriptedLlmHandler::new(definition.scripted_llm_responses.clone()));
    let scraper = Arc::new(FakeScraper);
    let prompt_engine = Arc::new(FakePromptEngine);
    let action_handler = Arc::new(ScriptedActionHandler::new(definition.scripted_action_results.clone()));
    let webhook_sender = Arc::new(HttpWebhookSender::new());
    let analytics = Arc::new(RecordingAnalyticsSink::new());

    let context = EngineContext::new(
        database.clone(),
        browser_manager,
        artifact_manager,
        llm,
        scraper,
        prompt_engine,
        action_handler,
        webhook_sender,
        analytics,
        settings,
    );
    let driver = context.build_driver();

    let organization_id: OrganizationId = definition
        .organization_id
        .clone()
        .map(OrganizationId::from)
        .unwrap_or_default();
    let organization = Organization {
        organization_id: organization_id.clone(),
        max_steps_per_run: None,
    };

    let task = database
        .create_task(NewTask {
            url: definition.url.clone(),
            title: definition.title.clone(),
            webhook_callback_url: definition.webhook_callback_url.clone(),
            navigation_goal: definition.navigation_goal.clone(),
            data_extraction_goal: definition.data_extraction_goal.clone(),
            navigation_payload: definition.navigation_payload.clone(),
            organization_id: organization_id.clone(),
            proxy_location: definition.proxy_location.clone(),
            extracted_information_schema: None,
            error_code_mapping: definition.error_code_mapping.clone(),
            workflow_run_id: None,
        })
        .await?;
    let task = database
        .update_task(
            &task.task_id,
            &organization_id,
            crate::ports::TaskChanges::status(crate::model::TaskStatus::Running),
        )
        .await?;
    let step = database.create_step(&task.task_id, &organization_id, 0, 0).await?;

    info!(task_id = %task.task_id, "starting task run");

    let (last_step, _detailed, next_step) = driver
        .execute_step(&organization, task.clone(), step, &ExecutionContext::default(), api_key, false, true)
        .await?;

    let final_task = database
        .get_task(&task.task_id, &organization_id)
        .await?
        .context("task disappeared mid-run")?;
    let response = TaskResponse::from_task(&final_task, None, None);

    println!("{}", serde_json::to_string_pretty(&response)?);
    info!(
        task_id = %last_step.task_id,
        status = ?final_task.status,
        next_step_pending = next_step.is_some(),
        "task run finished"
    );

    Ok(())
}
