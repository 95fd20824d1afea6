use crate::error::{LlmError, Result};
use crate::payload::{RequestPayload, SECRET_KEYS};
use crate::service::BatchCompletionService;
use crate::types::CompletionResponse;
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Payload key naming an alternative endpoint base URL.
pub const API_BASE_PARAM: &str = "api_base";

/// Upper bound on chat-completions requests a single batch keeps open at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible batch service: one chat-completions request per prompt
/// sequence, at most `max_in_flight` open at a time, results in input order.
#[derive(Clone)]
pub struct OpenAiBatchService {
    http: reqwest::Client,
    api_base: String,
    max_in_flight: usize,
}

impl OpenAiBatchService {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self::with_client(http)
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Zero is treated as one.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    fn endpoint(&self, payload: &RequestPayload) -> String {
        let base = payload
            .get(API_BASE_PARAM)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.api_base);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    #[tracing::instrument(level = "debug", skip(self, url, api_key, body))]
    async fn complete_one(
        &self,
        index: usize,
        url: &str,
        api_key: Option<&str>,
        body: Map<String, Value>,
    ) -> Result<CompletionResponse> {
        let mut request = self.http.post(url).json(&body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::debug!(%status, "completion request rejected");
            return Err(status_error(status, &text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)?;
        Ok(parsed)
    }
}

impl Default for OpenAiBatchService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchCompletionService for OpenAiBatchService {
    #[tracing::instrument(level = "info", skip_all)]
    async fn submit_batch(&self, payload: &RequestPayload) -> Result<Vec<CompletionResponse>> {
        let url = self.endpoint(payload);
        let api_key = payload
            .api_key()
            .or_else(|| payload.get("access_token").and_then(Value::as_str))
            .map(str::to_string);

        let mut shared = payload.as_map().clone();
        let Some(Value::Array(batch)) = shared.remove("messages") else {
            return Err(LlmError::InvalidInput(
                "payload messages must be an array of prompt sequences".to_string(),
            ));
        };
        shared.remove(API_BASE_PARAM);
        for key in SECRET_KEYS {
            shared.remove(key);
        }

        tracing::debug!(
            batch_size = batch.len(),
            max_in_flight = self.max_in_flight,
            model = payload.model().unwrap_or_default(),
            "submitting batch"
        );

        let requests = batch.into_iter().enumerate().map(|(index, messages)| {
            let mut body = shared.clone();
            body.insert("messages".to_string(), messages);
            self.complete_one(index, &url, api_key.as_deref(), body)
        });
        stream::iter(requests)
            .buffered(self.max_in_flight)
            .try_collect()
            .await
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenAiErrorDetail {
    Message { message: String },
    Text(String),
}

fn status_error(status: reqwest::StatusCode, body: &str) -> LlmError {
    match serde_json::from_str::<OpenAiErrorBody>(body) {
        Ok(OpenAiErrorBody {
            error: OpenAiErrorDetail::Message { message } | OpenAiErrorDetail::Text(message),
        }) => LlmError::Provider {
            status: status.as_u16(),
            message,
        },
        Err(_) => LlmError::Http(format!("openai chat status={status} body={body}")),
    }
}
