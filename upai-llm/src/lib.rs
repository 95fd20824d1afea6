//! Batch LLM request adapter.
//!
//! Builds one request payload for a batch of chat prompt sequences, hands it
//! to a [`BatchCompletionService`], and reports a [`ResultRecord`] per
//! sequence. Submission failures are returned as data, never as errors.

mod adapter;
mod config;
mod error;
mod openai;
mod payload;
mod service;
mod types;

pub use adapter::RequestAdapter;
pub use config::{ACCESS_TOKEN_PARAM, ClientConfig, MODEL_PARAM};
pub use error::{LlmError, Result};
pub use openai::{API_BASE_PARAM, DEFAULT_API_BASE, DEFAULT_MAX_IN_FLIGHT, OpenAiBatchService};
pub use payload::{DEFAULT_TEMPERATURE, RequestPayload, SECRET_KEYS, redact_secrets};
pub use service::BatchCompletionService;
pub use types::{
    ChatMessage, Choice, ChoiceMessage, CompletionResponse, PromptSequence, ResultRecord, Usage,
};
