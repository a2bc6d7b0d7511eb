//! HTTP client for a local ComfyUI service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::sink::PromptSink;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8188";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct QueuePromptRequest<'a> {
    prompt: &'a Value,
}

#[derive(Debug, Deserialize)]
struct QueuePromptResponse {
    prompt_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    queue_running: Vec<Value>,
    #[serde(default)]
    queue_pending: Vec<Value>,
}

/// Jobs currently running and waiting on the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub running: usize,
    pub pending: usize,
}

#[derive(Clone)]
pub struct ComfyClient {
    client: Client,
    base_url: String,
}

impl ComfyClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn queue_status(&self) -> Result<QueueStatus, SinkError> {
        let response = self
            .client
            .get(format!("{}/queue", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let queue: QueueResponse = response.json().await?;
        Ok(QueueStatus {
            running: queue.queue_running.len(),
            pending: queue.queue_pending.len(),
        })
    }
}

async fn status_error(response: reqwest::Response) -> SinkError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    SinkError::Status { status, body }
}

#[async_trait]
impl PromptSink for ComfyClient {
    async fn probe(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/system_stats", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(base_url = %self.base_url, error = %err, "probe failed");
                false
            }
        }
    }

    async fn submit(&self, workflow: &Value) -> Result<String, SinkError> {
        if !self.probe().await {
            warn!(base_url = %self.base_url, "service not reachable");
            return Err(SinkError::Unreachable(self.base_url.clone()));
        }

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .timeout(SUBMIT_TIMEOUT)
            .json(&QueuePromptRequest { prompt: workflow })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let queued: QueuePromptResponse = response.json().await?;
        queued.prompt_id.ok_or(SinkError::MissingPromptId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ComfyClient::new("http://127.0.0.1:8188/");
        assert_eq!(client.base_url(), "http://127.0.0.1:8188");
    }

    #[test]
    fn queue_response_tolerates_missing_lists() {
        let queue: QueueResponse =
            serde_json::from_str(r#"{"queue_running": [[0, "a"]]}"#).expect("parse");
        assert_eq!(queue.queue_running.len(), 1);
        assert!(queue.queue_pending.is_empty());
    }
}
