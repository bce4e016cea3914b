//! `Responder`: end-of-task finalization — analytics, final screenshot,
//! browser teardown, artifact flush, and the at-most-once signed webhook
//! POST.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

use wayrunner_core_types::{ArtifactId, OrganizationId, TaskId};

use crate::errors::{EngineError, EngineResult};
use crate::model::{Artifact, ArtifactType, TaskResponse};
use crate::ports::{AnalyticsSink, ArtifactData, BrowserManager, Database, WebhookHeaders, WebhookSender};

use super::artifact_sink::ArtifactSink;

type HmacSha256 = Hmac<Sha256>;

pub struct Responder {
    database: Arc<dyn Database>,
    browser_manager: Arc<dyn BrowserManager>,
    artifact_sink: Arc<ArtifactSink>,
    analytics: Arc<dyn AnalyticsSink>,
    webhook_sender: Arc<dyn WebhookSender>,
}

impl Responder {
    pub fn new(
        database: Arc<dyn Database>,
        browser_manager: Arc<dyn BrowserManager>,
        artifact_sink: Arc<ArtifactSink>,
        analytics: Arc<dyn AnalyticsSink>,
        webhook_sender: Arc<dyn WebhookSender>,
    ) -> Self {
        Self {
            database,
            browser_manager,
            artifact_sink,
            analytics,
            webhook_sender,
        }
    }

    pub async fn finalize(
        &self,
        task_id: &TaskId,
        organization_id: &OrganizationId,
        api_key: Option<&str>,
        close_browser_on_completion: bool,
    ) -> EngineResult<()> {
        let task = self
            .database
            .get_task(task_id, organization_id)
            .await?
            .ok_or_else(|| EngineError::task_not_found(task_id))?;

        if let Err(err) = self
            .analytics
            .capture(
                "task-status",
                serde_json::json!({"task_id": task_id.to_string(), "status": task.status}),
            )
            .await
        {
            warn!(task_id = %task_id, error = %err, "failed to emit analytics event");
        }

        let final_step_id = wayrunner_core_types::StepId::new();
        let mut screenshot_artifact_id: Option<ArtifactId> = None;
        match self.browser_manager.get_or_create_for_task(&task).await {
            Ok(browser_state) => match &browser_state.page {
                Some(page) => match page.take_screenshot(true).await {
                    Ok(screenshot) => {
                        screenshot_artifact_id = self
                            .artifact_sink
                            .create_artifact(
                                task_id,
                                &final_step_id,
                                organization_id,
                                ArtifactType::ScreenshotFinal,
                                ArtifactData::Bytes(screenshot),
                            )
                            .await;
                    }
                    Err(err) => {
                        warn!(task_id = %task_id, error = %err, "final screenshot unavailable, page may already be closed");
                    }
                },
                None => {
                    warn!(task_id = %task_id, "no page available for final screenshot");
                }
            },
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "failed to acquire final browser page for screenshot");
            }
        }

        if task.workflow_run_id.is_some() {
            return Ok(());
        }

        let mut recording_artifact_id: Option<ArtifactId> = None;
        if let Ok(Some(browser_state)) = self.browser_manager.cleanup_for_task(task_id, close_browser_on_completion).await {
            recording_artifact_id = browser_state.browser_artifacts.video_artifact_id.clone();
            if let (Some(video_artifact_id), Ok(Some(video))) =
                (&recording_artifact_id, self.browser_manager.get_video_data(task_id).await)
            {
                self.artifact_sink.update_artifact_data(video_artifact_id, organization_id, video).await;
            }
            if let Ok(Some(har)) = self.browser_manager.get_har_data(task_id).await {
                self.artifact_sink
                    .create_artifact(task_id, &final_step_id, organization_id, ArtifactType::Har, ArtifactData::Bytes(har))
                    .await;
            }
            if let Some(traces_dir) = &browser_state.browser_artifacts.traces_dir {
                self.artifact_sink
                    .create_artifact(
                        task_id,
                        &final_step_id,
                        organization_id,
                        ArtifactType::Trace,
                        ArtifactData::Path(traces_dir.clone()),
                    )
                    .await;
            }
        }

        self.artifact_sink.wait_for_upload(task_id).await?;

        let webhook_url = match &task.webhook_callback_url {
            Some(url) => url,
            None => return Ok(()),
        };
        let Some(api_key) = api_key else { return Ok(()) };

        let screenshot_url = self
            .share_link(screenshot_artifact_id, task_id, &final_step_id, organization_id, ArtifactType::ScreenshotFinal)
            .await;
        let recording_url = self
            .share_link(recording_artifact_id, task_id, &final_step_id, organization_id, ArtifactType::Recording)
            .await;

        let response = TaskResponse::from_task(&task, screenshot_url, recording_url);
        let body = response.to_webhook_body()?;
        let headers = sign_payload(&body, api_key)?;

        match self.webhook_sender.send(webhook_url, &body, headers).await {
            Ok(response) if response.ok => {
                info!(task_id = %task_id, status = response.status, "webhook delivered");
            }
            Ok(response) => {
                warn!(task_id = %task_id, status = response.status, body = %response.body, "webhook returned a non-OK status");
            }
            Err(err) => return Err(EngineError::failed_to_send_webhook(task_id, err)),
        }

        Ok(())
    }

    async fn share_link(
        &self,
        artifact_id: Option<ArtifactId>,
        task_id: &TaskId,
        step_id: &wayrunner_core_types::StepId,
        organization_id: &OrganizationId,
        artifact_type: ArtifactType,
    ) -> Option<String> {
        let artifact_id = artifact_id?;
        let artifact = Artifact {
            artifact_id,
            task_id: task_id.clone(),
            step_id: step_id.clone(),
            organization_id: organization_id.clone(),
            artifact_type,
            uri: None,
            created_at: chrono::Utc::now(),
        };
        self.artifact_sink.get_share_link(&artifact).await
    }
}

/// Compute `x-skyvern-timestamp`/`x-skyvern-signature` over the exact body
/// bytes; an opaque shared-secret HMAC the receiver re-derives.
fn sign_payload(body: &str, api_key: &str) -> EngineResult<WebhookHeaders> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| EngineError::internal(format!("system clock before epoch: {err}")))?
        .as_secs()
        .to_string();

    let mut mac = HmacSha256::new_from_slice(api_key.as_bytes())
        .map_err(|err| EngineError::internal(format!("invalid HMAC key: {err}")))?;
    mac.update(body.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(WebhookHeaders { timestamp, signature })
}
