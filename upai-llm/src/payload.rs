//! Request payload assembly.

use crate::config::ClientConfig;
use crate::types::PromptSequence;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// Sampling temperature sent unless `extra_params` overrides it.
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

/// Payload keys that carry credentials.
pub const SECRET_KEYS: [&str; 2] = ["api_key", "access_token"];

/// Fully assembled batch request: `model`, `messages` (one entry per prompt
/// sequence), `temperature`, `api_key`, then every extra parameter overlaid.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestPayload(Map<String, Value>);

impl RequestPayload {
    pub fn build(config: &ClientConfig, sequences: &[PromptSequence]) -> Self {
        let mut map = Map::new();
        map.insert(
            "model".to_string(),
            Value::String(config.llm_identifier().to_string()),
        );
        map.insert("messages".to_string(), json!(sequences));
        map.insert("temperature".to_string(), Value::from(DEFAULT_TEMPERATURE));
        map.insert(
            "api_key".to_string(),
            Value::String(config.access_token().to_string()),
        );
        for (k, v) in config.extra_params() {
            map.insert(k.clone(), v.clone());
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn model(&self) -> Option<&str> {
        self.get("model").and_then(Value::as_str)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.get("api_key").and_then(Value::as_str)
    }

    /// One `messages` entry per prompt sequence, as built.
    pub fn messages(&self) -> Option<&Vec<Value>> {
        self.get("messages").and_then(Value::as_array)
    }

    /// Copy with credential values replaced, for display and logging.
    pub fn redacted(&self) -> Self {
        let mut map = self.0.clone();
        redact_secrets(&mut map);
        Self(map)
    }
}

impl From<Map<String, Value>> for RequestPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Debug for RequestPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestPayload")
            .field(&self.redacted().0)
            .finish()
    }
}

pub fn redact_secrets(map: &mut Map<String, Value>) {
    for key in SECRET_KEYS {
        if let Some(v) = map.get_mut(key) {
            *v = Value::String("<redacted>".to_string());
        }
    }
}
