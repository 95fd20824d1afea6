use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Free-form role tag ("system", "user", "assistant", ...), passed through as-is.
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// One conversation to be completed. The first message's content is the
/// query reported back in every [`ResultRecord`].
pub type PromptSequence = Vec<ChatMessage>;

pub(crate) fn original_query(sequence: &[ChatMessage]) -> String {
    sequence
        .first()
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

/// Token accounting for one completion, as reported by the provider. Counts
/// the provider leaves out or sends as null stay `None`; fields beyond the
/// standard three are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Usage {
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// One provider response, in chat-completions shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: ChoiceMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Convenience constructor for a single-choice assistant reply.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                message: ChoiceMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            ..Self::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Uniform per-sequence outcome of a batch call.
///
/// Serializes as `{"status": true, "content", "original_query", "usage"}` or
/// `{"status": false, "error", "original_query"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRecord {
    Success {
        content: String,
        original_query: String,
        usage: Option<Map<String, Value>>,
    },
    Failure {
        error: String,
        original_query: String,
    },
}

impl ResultRecord {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn original_query(&self) -> &str {
        match self {
            Self::Success { original_query, .. } | Self::Failure { original_query, .. } => {
                original_query
            }
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Success { content, .. } => Some(content),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

#[derive(Serialize)]
struct ResultRecordWire<'a> {
    status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    original_query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Option<&'a Map<String, Value>>>,
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success {
                content,
                original_query,
                usage,
            } => ResultRecordWire {
                status: true,
                content: Some(content),
                error: None,
                original_query,
                usage: Some(usage.as_ref()),
            },
            Self::Failure {
                error,
                original_query,
            } => ResultRecordWire {
                status: false,
                content: None,
                error: Some(error),
                original_query,
                usage: None,
            },
        };
        wire.serialize(serializer)
    }
}
