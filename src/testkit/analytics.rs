//! `RecordingAnalyticsSink`: appends every captured event to a
//! `Mutex<Vec<_>>` for assertions.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::EngineResult;
use crate::ports::AnalyticsSink;

#[derive(Default)]
pub struct RecordingAnalyticsSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingAnalyticsSink {
    async fn capture(&self, event: &str, properties: Value) -> EngineResult<()> {
        self.events.lock().push((event.to_string(), properties));
        Ok(())
    }
}
