//! `FakeWorkflowRunContext`: a static map of named parameter values, enough
//! to exercise `TaskDriver::begin_workflow_task` without a real workflow
//! orchestrator.

use std::collections::HashMap;

use serde_json::Value;

use crate::ports::WorkflowRunContext;

pub struct FakeWorkflowRunContext {
    values: HashMap<String, Value>,
}

impl FakeWorkflowRunContext {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}

impl WorkflowRunContext for FakeWorkflowRunContext {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}
