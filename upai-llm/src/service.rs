use crate::error::Result;
use crate::payload::RequestPayload;
use crate::types::CompletionResponse;
use async_trait::async_trait;

/// External batch-completion capability.
///
/// Must return exactly one response per `messages` entry of the payload, in
/// the same order. Any error fails the whole batch.
#[async_trait]
pub trait BatchCompletionService: Send + Sync {
    async fn submit_batch(&self, payload: &RequestPayload) -> Result<Vec<CompletionResponse>>;
}
