//! In-memory `BrowserManager`/`Page` fakes: no real browser, just enough
//! state to exercise the engine's control flow and artifact capture.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

use wayrunner_core_types::{ArtifactId, TaskId, WorkflowRunId};

use crate::errors::EngineResult;
use crate::model::Task;
use crate::ports::{BrowserArtifacts, BrowserManager, BrowserState, Page};

pub struct FakePage {
    url: Mutex<String>,
    html: String,
    screenshot: Vec<u8>,
}

impl FakePage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: Mutex::new(url.into()),
            html: html.into(),
            screenshot: b"fake-screenshot".to_vec(),
        }
    }
}

#[async_trait]
impl Page for FakePage {
    fn url(&self) -> String {
        self.url.lock().clone()
    }

    async fn content(&self) -> EngineResult<String> {
        Ok(self.html.clone())
    }

    async fn take_screenshot(&self, _full_page: bool) -> EngineResult<Vec<u8>> {
        Ok(self.screenshot.clone())
    }
}

#[derive(Default)]
pub struct FakeBrowserManager {
    task_states: DashMap<TaskId, BrowserState>,
    workflow_states: DashMap<WorkflowRunId, BrowserState>,
}

impl FakeBrowserManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_state(url: Option<&str>) -> BrowserState {
        BrowserState {
            page: Some(Arc::new(FakePage::new(url.unwrap_or("about:blank"), "<html></html>"))),
            browser_context: true,
            browser_artifacts: BrowserArtifacts::default(),
        }
    }
}

#[async_trait]
impl BrowserManager for FakeBrowserManager {
    async fn get_or_create_for_task(&self, task: &Task) -> EngineResult<BrowserState> {
        Ok(self
            .task_states
            .entry(task.task_id.clone())
            .or_insert_with(|| Self::fresh_state(task.url.as_deref()))
            .clone())
    }

    async fn get_or_create_for_workflow_run(&self, workflow_run_id: &WorkflowRunId, url: Option<&str>) -> EngineResult<BrowserState> {
        Ok(self
            .workflow_states
            .entry(workflow_run_id.clone())
            .or_insert_with(|| Self::fresh_state(url))
            .clone())
    }

    async fn get_video_data(&self, _task_id: &TaskId) -> EngineResult<Option<Vec<u8>>> {
        Ok(Some(b"fake-video-bytes".to_vec()))
    }

    async fn get_har_data(&self, _task_id: &TaskId) -> EngineResult<Option<Vec<u8>>> {
        Ok(Some(b"fake-har-bytes".to_vec()))
    }

    async fn set_video_artifact_for_task(&self, task_id: &TaskId, artifact_id: ArtifactId) -> EngineResult<()> {
        if let Some(mut state) = self.task_states.get_mut(task_id) {
            state.browser_artifacts.video_artifact_id = Some(artifact_id);
        }
        Ok(())
    }

    async fn cleanup_for_task(&self, task_id: &TaskId, _close_on_completion: bool) -> EngineResult<Option<BrowserState>> {
        Ok(self.task_states.get(task_id).map(|state| state.clone()))
    }
}
