//! `HttpWebhookSender`: the production `WebhookSender` adapter — POSTs the
//! signed task response body to the organization's configured callback URL.

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::{EngineError, EngineResult};
use crate::ports::{WebhookHeaders, WebhookResponse, WebhookSender};

pub struct HttpWebhookSender {
    client: Client,
}

impl HttpWebhookSender {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for HttpWebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, url: &str, body: &str, headers: WebhookHeaders) -> EngineResult<WebhookResponse> {
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .header("x-skyvern-timestamp", headers.timestamp)
            .header("x-skyvern-signature", headers.signature)
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| EngineError::internal(format!("webhook POST to {url} failed: {err}")))?;

        let status = response.status().as_u16();
        let ok = response.status().is_success();
        let body = response
            .text()
            .await
            .map_err(|err| EngineError::internal(format!("reading webhook response body: {err}")))?;

        Ok(WebhookResponse { status, ok, body })
    }
}
