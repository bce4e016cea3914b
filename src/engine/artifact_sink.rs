//! Wraps `ArtifactManager` with the capture-never-fatal policy: individual
//! artifact failures are logged and swallowed at this layer so callers in
//! `StepExecutor`/`PromptBuilder`/`Responder` never need to handle them.
//! `wait_for_upload` alone propagates — it is the barrier, not a capture.

use std::sync::Arc;

use tracing::warn;

use wayrunner_core_types::{ArtifactId, OrganizationId, StepId, TaskId};

use crate::errors::EngineResult;
use crate::model::{Artifact, ArtifactType};
use crate::ports::{ArtifactData, ArtifactManager};

pub struct ArtifactSink {
    manager: Arc<dyn ArtifactManager>,
}

impl ArtifactSink {
    pub fn new(manager: Arc<dyn ArtifactManager>) -> Self {
        Self { manager }
    }

    /// Enqueue a durable upload; `None` on failure, logged, never fatal.
    pub async fn create_artifact(
        &self,
        task_id: &TaskId,
        step_id: &StepId,
        organization_id: &OrganizationId,
        artifact_type: ArtifactType,
        data: ArtifactData,
    ) -> Option<ArtifactId> {
        match self
            .manager
            .create_artifact(task_id, step_id, organization_id, artifact_type, data)
            .await
        {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(task_id = %task_id, step_id = %step_id, ?artifact_type, error = %err, "artifact capture failed");
                None
            }
        }
    }

    pub async fn update_artifact_data(&self, artifact_id: &ArtifactId, organization_id: &OrganizationId, data: Vec<u8>) {
        if let Err(err) = self.manager.update_artifact_data(artifact_id, organization_id, data).await {
            warn!(artifact_id = %artifact_id, error = %err, "artifact update failed");
        }
    }

    /// Blocks until every outstanding upload for the task resolves. The only
    /// genuine barrier failure this module surfaces.
    pub async fn wait_for_upload(&self, task_id: &TaskId) -> EngineResult<()> {
        self.manager.wait_for_upload(task_id).await
    }

    pub async fn get_share_link(&self, artifact: &Artifact) -> Option<String> {
        match self.manager.get_share_link(artifact).await {
            Ok(link) => link,
            Err(err) => {
                warn!(artifact_id = %artifact.artifact_id, error = %err, "failed to resolve share link");
                None
            }
        }
    }
}
