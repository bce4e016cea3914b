//! `FakeArtifactManager`: captures go straight into a map, so
//! `wait_for_upload` is always immediately satisfied — there is no async
//! upload to wait for in tests.

use async_trait::async_trait;
use dashmap::DashMap;

use wayrunner_core_types::{ArtifactId, OrganizationId, StepId, TaskId};

use crate::errors::EngineResult;
use crate::model::{Artifact, ArtifactType};
use crate::ports::{ArtifactData, ArtifactManager};

#[derive(Default)]
pub struct FakeArtifactManager {
    blobs: DashMap<ArtifactId, ArtifactData>,
}

impl FakeArtifactManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, artifact_id: &ArtifactId) -> Option<ArtifactData> {
        self.blobs.get(artifact_id).map(|entry| entry.clone())
    }
}

#[async_trait]
impl ArtifactManager for FakeArtifactManager {
    async fn create_artifact(
        &self,
        _task_id: &TaskId,
        _step_id: &StepId,
        _organization_id: &OrganizationId,
        _artifact_type: ArtifactType,
        data: ArtifactData,
    ) -> EngineResult<ArtifactId> {
        let artifact_id = ArtifactId::new();
        self.blobs.insert(artifact_id.clone(), data);
        Ok(artifact_id)
    }

    async fn update_artifact_data(&self, artifact_id: &ArtifactId, _organization_id: &OrganizationId, data: Vec<u8>) -> EngineResult<()> {
        self.blobs.insert(artifact_id.clone(), ArtifactData::Bytes(data));
        Ok(())
    }

    async fn wait_for_upload(&self, _task_id: &TaskId) -> EngineResult<()> {
        Ok(())
    }

    async fn get_share_link(&self, artifact: &Artifact) -> EngineResult<Option<String>> {
        Ok(Some(format!("https://artifacts.test/{}", artifact.artifact_id)))
    }
}
