//! `FakePromptEngine`: renders a plain, deterministic string embedding every
//! variable, enough to assert on in tests without a real template engine.

use crate::errors::EngineResult;
use crate::ports::{PromptEngine, PromptVars};

pub struct FakePromptEngine;

impl PromptEngine for FakePromptEngine {
    fn load_prompt(&self, name: &str, vars: PromptVars) -> EngineResult<String> {
        Ok(format!(
            "template={name} goal={:?} url={} extraction_goal={:?} payload={} history={}",
            vars.navigation_goal, vars.url, vars.data_extraction_goal, vars.navigation_payload_str, vars.action_history
        ))
    }
}
