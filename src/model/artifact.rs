use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayrunner_core_types::{ArtifactId, OrganizationId, StepId, TaskId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactType {
    ScreenshotAction,
    ScreenshotFinal,
    HtmlScrape,
    HtmlAction,
    Recording,
    Har,
    Trace,
    VisibleElementsIdXpathMap,
    VisibleElementsTree,
    VisibleElementsTreeTrimmed,
}

/// An opaque, durable blob attached to a `(task_id, step_id)` pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: ArtifactId,
    pub task_id: TaskId,
    pub step_id: StepId,
    pub organization_id: OrganizationId,
    pub artifact_type: ArtifactType,
    pub uri: Option<String>,
    pub created_at: DateTime<Utc>,
}
