use std::collections::HashMap;

use serde_json::Value;

use wayrunner_core_types::OrganizationId;

/// The owning Workflow's identity/settings needed to construct a
/// workflow-embedded Task.
#[derive(Clone, Debug)]
pub struct WorkflowRef {
    pub organization_id: OrganizationId,
    pub proxy_location: Option<String>,
}

/// A single task block inside a workflow definition.
#[derive(Clone, Debug, Default)]
pub struct TaskBlock {
    pub url: Option<String>,
    pub title: Option<String>,
    pub navigation_goal: Option<String>,
    pub data_extraction_goal: Option<String>,
    pub parameter_keys: Vec<String>,
    pub error_code_mapping: Option<HashMap<String, String>>,
    pub data_schema: Option<Value>,
}
