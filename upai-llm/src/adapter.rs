use crate::config::ClientConfig;
use crate::error::{LlmError, Result};
use crate::openai::OpenAiBatchService;
use crate::payload::RequestPayload;
use crate::service::BatchCompletionService;
use crate::types::{CompletionResponse, PromptSequence, ResultRecord, original_query};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Formats prompt batches into a single payload, submits it, and maps the
/// outcome to one [`ResultRecord`] per prompt sequence.
#[derive(Clone)]
pub struct RequestAdapter {
    config: ClientConfig,
    service: Arc<dyn BatchCompletionService>,
}

impl RequestAdapter {
    /// Resolve configuration and wire the default OpenAI-compatible service.
    /// No network access happens here.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(
        llm_identifier: Option<&str>,
        access_token: Option<&str>,
        llm_params: Option<Map<String, Value>>,
    ) -> Result<Self> {
        let config = ClientConfig::resolve(llm_identifier, access_token, llm_params)?;
        Ok(Self::with_service(config, Arc::new(OpenAiBatchService::new())))
    }

    pub fn with_service(config: ClientConfig, service: Arc<dyn BatchCompletionService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn llm_identifier(&self) -> &str {
        self.config.llm_identifier()
    }

    pub fn access_token(&self) -> &str {
        self.config.access_token()
    }

    pub fn build_payload(&self, sequences: &[PromptSequence]) -> RequestPayload {
        RequestPayload::build(&self.config, sequences)
    }

    /// Submit all sequences in one service call. Never fails: submission or
    /// mapping errors become a `Failure` record for every sequence.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(model = %self.config.llm_identifier(), batch_size = sequences.len())
    )]
    pub async fn process_batch(
        &self,
        sequences: &[PromptSequence],
        debug_mode: bool,
    ) -> Vec<ResultRecord> {
        let payload = self.build_payload(sequences);

        let outcome = match self.service.submit_batch(&payload).await {
            Ok(responses) => {
                if debug_mode {
                    tracing::info!(raw_responses = ?responses, "llm raw response");
                }
                map_responses(responses, sequences)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(records) => {
                tracing::debug!(records = records.len(), "batch completed");
                records
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch failed; reporting failure for every sequence");
                failure_records(&e.to_string(), sequences)
            }
        }
    }
}

impl fmt::Debug for RequestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn map_responses(
    responses: Vec<CompletionResponse>,
    sequences: &[PromptSequence],
) -> Result<Vec<ResultRecord>> {
    if responses.len() != sequences.len() {
        return Err(LlmError::ResponseFormat(format!(
            "expected {} responses, got {}",
            sequences.len(),
            responses.len()
        )));
    }

    responses
        .into_iter()
        .zip(sequences)
        .map(|(response, sequence)| {
            let choice = response.choices.into_iter().next().ok_or_else(|| {
                LlmError::ResponseFormat("response missing choices".to_string())
            })?;
            Ok(ResultRecord::Success {
                content: choice.message.content.unwrap_or_default(),
                original_query: original_query(sequence),
                usage: response.usage.map(|u| u.to_map()),
            })
        })
        .collect()
}

fn failure_records(error: &str, sequences: &[PromptSequence]) -> Vec<ResultRecord> {
    sequences
        .iter()
        .map(|sequence| ResultRecord::Failure {
            error: error.to_string(),
            original_query: original_query(sequence),
        })
        .collect()
}
