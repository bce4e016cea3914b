//! `RecordingWebhookSender`: appends every call it receives to a
//! `Mutex<Vec<_>>` for assertions, rather than performing a real HTTP POST.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::EngineResult;
use crate::ports::{WebhookHeaders, WebhookResponse, WebhookSender};

#[derive(Clone, Debug)]
pub struct RecordedWebhookCall {
    pub url: String,
    pub body: String,
    pub headers: WebhookHeaders,
}

pub struct RecordingWebhookSender {
    calls: Mutex<Vec<RecordedWebhookCall>>,
    response: WebhookResponse,
}

impl RecordingWebhookSender {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response: WebhookResponse {
                status: 200,
                ok: true,
                body: String::new(),
            },
        }
    }

    pub fn calls(&self) -> Vec<RecordedWebhookCall> {
        self.calls.lock().clone()
    }
}

impl Default for RecordingWebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookSender for RecordingWebhookSender {
    async fn send(&self, url: &str, body: &str, headers: WebhookHeaders) -> EngineResult<WebhookResponse> {
        self.calls.lock().push(RecordedWebhookCall {
            url: url.to_string(),
            body: body.to_string(),
            headers,
        });
        Ok(self.response.clone())
    }
}
