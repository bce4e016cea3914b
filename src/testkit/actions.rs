//! `ScriptedActionHandler`: a queue of pre-scripted result batches consumed
//! one per `handle` call, mirroring `ScriptedLlmHandler`'s shape so a whole
//! task run can be scripted end-to-end.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{EngineError, EngineResult};
use crate::model::{Action, ActionResult, ScrapedPage, Step, Task};
use crate::ports::{ActionHandler, BrowserState};

pub struct ScriptedActionHandler {
    results: Mutex<std::collections::VecDeque<Vec<ActionResult>>>,
}

impl ScriptedActionHandler {
    pub fn new(results: Vec<Vec<ActionResult>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
        }
    }
}

#[async_trait]
impl ActionHandler for ScriptedActionHandler {
    async fn handle(
        &self,
        _page: &ScrapedPage,
        _task: &Task,
        _step: &Step,
        _browser_state: &BrowserState,
        _action: &Action,
    ) -> EngineResult<Vec<ActionResult>> {
        self.results
            .lock()
            .pop_front()
            .ok_or_else(|| EngineError::internal("scripted action handler has no more results queued"))
    }
}
