//! Integration tests exercising the task execution engine end to end
//! against the in-memory reference collaborators.

use std::sync::Arc;

use serde_json::json;

use wayrunner::config::EngineSettings;
use wayrunner::model::{ActionResult, ExecutionContext, Organization, StepStatus, TaskStatus};
use wayrunner::ports::{Database, NewTask, TaskChanges};
use wayrunner::testkit::{
    FakeArtifactManager, FakeBrowserManager, FakePromptEngine, FakeScraper, InMemoryDatabase, RecordingAnalyticsSink,
    RecordingWebhookSender, ScriptedActionHandler, ScriptedLlmHandler,
};
use wayrunner::EngineContext;

struct Harness {
    driver: wayrunner::engine::TaskDriver,
    database: Arc<InMemoryDatabase>,
    webhook_sender: Arc<RecordingWebhookSender>,
    analytics: Arc<RecordingAnalyticsSink>,
}

fn build_harness(settings: EngineSettings, llm_responses: Vec<serde_json::Value>, action_results: Vec<Vec<ActionResult>>) -> Harness {
    let database = Arc::new(InMemoryDatabase::new());
    let browser_manager = Arc::new(FakeBrowserManager::new());
    let artifact_manager = Arc::new(FakeArtifactManager::new());
    let llm = Arc::new(ScriptedLlmHandler::new(llm_responses));
    let scraper = Arc::new(FakeScraper);
    let prompt_engine = Arc::new(FakePromptEngine);
    let action_handler = Arc::new(ScriptedActionHandler::new(action_results));
    let webhook_sender = Arc::new(RecordingWebhookSender::new());
    let analytics = Arc::new(RecordingAnalyticsSink::new());

    let context = EngineContext::new(
        database.clone(),
        browser_manager,
        artifact_manager,
        llm,
        scraper,
        prompt_engine,
        action_handler,
        webhook_sender.clone(),
        analytics.clone(),
        settings,
    );
    let driver = context.build_driver();

    Harness {
        driver,
        database,
        webhook_sender,
        analytics,
    }
}

async fn seed_task(database: &InMemoryDatabase, navigation_goal: Option<&str>, webhook_url: Option<&str>) -> (wayrunner::model::Task, wayrunner::model::Step, Organization) {
    let organization = Organization {
        organization_id: Default::default(),
        max_steps_per_run: None,
    };
    let task = database
        .create_task(NewTask {
            url: Some("https://x".to_string()),
            navigation_goal: navigation_goal.map(|s| s.to_string()),
            webhook_callback_url: webhook_url.map(|s| s.to_string()),
            organization_id: organization.organization_id.clone(),
            navigation_payload: json!({}),
            ..Default::default()
        })
        .await
        .unwrap();
    let task = database
        .update_task(&task.task_id, &organization.organization_id, TaskChanges::status(TaskStatus::Running))
        .await
        .unwrap();
    let step = database.create_step(&task.task_id, &organization.organization_id, 0, 0).await.unwrap();
    (task, step, organization)
}

fn settings_without_chaining() -> EngineSettings {
    EngineSettings {
        execute_all_steps: false,
        ..EngineSettings::default()
    }
}

#[tokio::test]
async fn e1_happy_path_single_step_advances() {
    let llm_response = json!({"actions": [{"action_type": "CLICK", "element_id": "e1"}]});
    let action_results = vec![vec![ActionResult {
        success: true,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: 0,
        exception_type: None,
    }]];
    let harness = build_harness(settings_without_chaining(), vec![llm_response], action_results);
    let (task, step, organization) = seed_task(&harness.database, Some("click login"), None).await;

    let (last_step, _detailed, next_step) = harness
        .driver
        .execute_step(&organization, task.clone(), step, &ExecutionContext::default(), None, false, true)
        .await
        .unwrap();

    assert_eq!(last_step.status, StepStatus::Completed);
    let next_step = next_step.expect("advance should hand back a next step");
    assert_eq!(next_step.order, 1);
    assert_eq!(next_step.retry_index, 0);

    let refreshed_task = harness
        .database
        .get_task(&task.task_id, &organization.organization_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed_task.status, TaskStatus::Running);
}

#[tokio::test]
async fn e2_goal_achieved_completes_task_with_extracted_information() {
    let llm_response = json!({"actions": [{"action_type": "COMPLETE", "data": {"name": "Alice"}}]});
    let action_results = vec![vec![ActionResult {
        success: true,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: 0,
        exception_type: None,
    }]];
    let harness = build_harness(settings_without_chaining(), vec![llm_response], action_results);
    let (task, step, organization) = seed_task(&harness.database, Some("extract name"), Some("https://hooks.test/x")).await;

    let (last_step, _detailed, next_step) = harness
        .driver
        .execute_step(&organization, task.clone(), step, &ExecutionContext::default(), Some("secret"), false, true)
        .await
        .unwrap();

    assert!(last_step.is_last);
    assert!(next_step.is_none());

    let refreshed_task = harness
        .database
        .get_task(&task.task_id, &organization.organization_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed_task.status, TaskStatus::Completed);
    assert_eq!(refreshed_task.extracted_information, Some(json!({"name": "Alice"})));

    let calls = harness.webhook_sender.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].body.contains("navigation_payload"));
}

#[tokio::test]
async fn e3_retry_then_give_up() {
    let settings = EngineSettings {
        max_retries_per_step: 2,
        execute_all_steps: true,
        ..EngineSettings::default()
    };
    let fail = ActionResult {
        success: false,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: 0,
        exception_type: Some("ElementNotFound".to_string()),
    };
    let llm_response = json!({"actions": [{"action_type": "CLICK", "element_id": "e1"}]});
    let harness = build_harness(
        settings,
        vec![llm_response.clone(), llm_response.clone(), llm_response],
        vec![vec![fail.clone()], vec![fail.clone()], vec![fail]],
    );
    let (task, step, organization) = seed_task(&harness.database, Some("click login"), None).await;

    let (last_step, _detailed, next_step) = harness
        .driver
        .execute_step(&organization, task.clone(), step, &ExecutionContext::default(), None, false, true)
        .await
        .unwrap();

    assert!(next_step.is_none());
    assert_eq!(last_step.status, StepStatus::Failed);
    assert_eq!(last_step.retry_index, 2);

    let refreshed_task = harness
        .database
        .get_task(&task.task_id, &organization.organization_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed_task.status, TaskStatus::Failed);
    assert_eq!(
        refreshed_task.failure_reason,
        Some("Max retries per step (2) exceeded".to_string())
    );
}

#[tokio::test]
async fn e4_wait_pruning_dispatches_only_real_actions() {
    let llm_response = json!({"actions": [
        {"action_type": "WAIT"},
        {"action_type": "CLICK", "element_id": "e1"},
        {"action_type": "WAIT"},
        {"action_type": "CLICK", "element_id": "e2"},
    ]});
    let success = |order: u32| ActionResult {
        success: true,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: order,
        exception_type: None,
    };
    let harness = build_harness(
        settings_without_chaining(),
        vec![llm_response],
        vec![vec![success(0)], vec![success(0)]],
    );
    let (task, step, organization) = seed_task(&harness.database, Some("click both"), None).await;

    let (last_step, detailed, _next_step) = harness
        .driver
        .execute_step(&organization, task, step, &ExecutionContext::default(), None, false, true)
        .await
        .unwrap();

    assert_eq!(last_step.status, StepStatus::Completed);
    let dispatched = detailed.actions.unwrap();
    assert_eq!(dispatched.len(), 2);
    assert!(dispatched.iter().all(|a| a.action_type() != wayrunner::model::ActionType::Wait));
}

#[tokio::test]
async fn e5_wait_only_sequence_is_preserved_and_fails() {
    let llm_response = json!({"actions": [{"action_type": "WAIT"}]});
    let wait_result = ActionResult {
        success: false,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: 0,
        exception_type: None,
    };
    let settings = EngineSettings {
        max_retries_per_step: 0,
        ..settings_without_chaining()
    };
    let harness = build_harness(settings, vec![llm_response], vec![vec![wait_result]]);
    let (task, step, organization) = seed_task(&harness.database, Some("wait for page"), None).await;

    let (last_step, detailed, next_step) = harness
        .driver
        .execute_step(&organization, task, step, &ExecutionContext::default(), None, false, true)
        .await
        .unwrap();

    assert_eq!(last_step.status, StepStatus::Failed);
    assert_eq!(detailed.actions.unwrap().len(), 1);
    assert!(next_step.is_none(), "a failed step with retries remaining yields no next step to the caller in non-chaining mode");
}

#[tokio::test]
async fn e6_workflow_embedded_task_skips_webhook() {
    let llm_response = json!({"actions": [{"action_type": "COMPLETE", "data": {"ok": true}}]});
    let action_results = vec![vec![ActionResult {
        success: true,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: 0,
        exception_type: None,
    }]];
    let harness = build_harness(settings_without_chaining(), vec![llm_response], action_results);

    let organization = Organization {
        organization_id: Default::default(),
        max_steps_per_run: None,
    };
    let task = harness
        .database
        .create_task(NewTask {
            url: Some("https://x".to_string()),
            navigation_goal: Some("finish".to_string()),
            webhook_callback_url: Some("https://hooks.test/x".to_string()),
            organization_id: organization.organization_id.clone(),
            workflow_run_id: Some(Default::default()),
            navigation_payload: json!({}),
            ..Default::default()
        })
        .await
        .unwrap();
    let task = harness
        .database
        .update_task(&task.task_id, &organization.organization_id, TaskChanges::status(TaskStatus::Running))
        .await
        .unwrap();
    let step = harness
        .database
        .create_step(&task.task_id, &organization.organization_id, 0, 0)
        .await
        .unwrap();

    harness
        .driver
        .execute_step(&organization, task, step, &ExecutionContext::default(), Some("secret"), true, true)
        .await
        .unwrap();

    assert!(harness.webhook_sender.calls().is_empty());
    assert_eq!(harness.analytics.events().len(), 1);
}

#[tokio::test]
async fn duplicate_element_guard_stops_remaining_actions() {
    let llm_response = json!({"actions": [
        {"action_type": "CLICK", "element_id": "e1"},
        {"action_type": "CLICK", "element_id": "e1"},
    ]});
    let success = ActionResult {
        success: true,
        data: None,
        javascript_triggered: false,
        step_retry_number: 0,
        step_order: 0,
        exception_type: None,
    };
    let harness = build_harness(settings_without_chaining(), vec![llm_response], vec![vec![success]]);
    let (task, step, organization) = seed_task(&harness.database, Some("click once"), None).await;

    let (last_step, detailed, _next_step) = harness
        .driver
        .execute_step(&organization, task, step, &ExecutionContext::default(), None, false, true)
        .await
        .unwrap();

    assert_eq!(last_step.status, StepStatus::Completed);
    let actions_and_results = detailed.actions_and_results.unwrap();
    assert!(actions_and_results[1].1.is_empty(), "second duplicate-element action should not have been dispatched");
}

#[tokio::test]
async fn javascript_triggered_action_ends_step_immediately() {
    let llm_response = json!({"actions": [
        {"action_type": "CLICK", "element_id": "e1"},
        {"action_type": "CLICK", "element_id": "e2"},
    ]});
    let js_triggered = ActionResult {
        success: true,
        data: None,
        javascript_triggered: true,
        step_retry_number: 0,
        step_order: 0,
        exception_type: None,
    };
    let harness = build_harness(settings_without_chaining(), vec![llm_response], vec![vec![js_triggered]]);
    let (task, step, organization) = seed_task(&harness.database, Some("click and reload"), None).await;

    let (last_step, detailed, _next_step) = harness
        .driver
        .execute_step(&organization, task, step, &ExecutionContext::default(), None, false, true)
        .await
        .unwrap();

    assert_eq!(last_step.status, StepStatus::Completed);
    let actions_and_results = detailed.actions_and_results.unwrap();
    assert!(actions_and_results[1].1.is_empty(), "action after the javascript-triggered one is never dispatched");
}

#[tokio::test]
async fn executing_a_terminal_task_fails_validation() {
    let harness = build_harness(settings_without_chaining(), vec![], vec![]);
    let (task, step, organization) = seed_task(&harness.database, Some("noop"), None).await;
    let task = harness
        .database
        .update_task(&task.task_id, &organization.organization_id, TaskChanges::status(TaskStatus::Completed))
        .await
        .unwrap();

    let result = harness
        .driver
        .execute_step(&organization, task, step, &ExecutionContext::default(), None, false, true)
        .await;

    assert!(result.is_err());
}
