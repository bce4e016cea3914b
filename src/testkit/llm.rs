//! `ScriptedLlmHandler`: a deterministic canned-response provider, following
//! the mock-provider shape of a queue of pre-scripted responses consumed one
//! per call, so a whole task run can be scripted ahead of time.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::{EngineError, EngineResult};
use crate::model::Step;
use crate::ports::LlmHandler;

pub struct ScriptedLlmHandler {
    responses: Mutex<std::collections::VecDeque<Value>>,
}

impl ScriptedLlmHandler {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LlmHandler for ScriptedLlmHandler {
    async fn call(&self, _prompt: &str, _step: &Step, _screenshots: &[Vec<u8>]) -> EngineResult<Value> {
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| EngineError::llm_failure("scripted LLM handler has no more responses queued"))
    }
}
