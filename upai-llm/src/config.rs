//! Client configuration: model identity, credential and pass-through parameters.

use crate::error::{LlmError, Result};
use crate::payload::redact_secrets;
use serde_json::{Map, Value};
use std::fmt;

/// Parameter key consulted when no explicit model identifier is given.
pub const MODEL_PARAM: &str = "model";
/// Parameter key consulted when no explicit access token is given.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Resolved, immutable client configuration.
///
/// `extra_params` is kept verbatim, including the `model` and
/// `access_token` entries it may have been resolved from.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    llm_identifier: String,
    access_token: String,
    extra_params: Map<String, Value>,
}

impl ClientConfig {
    /// Resolve identifier and token from explicit arguments first, then from
    /// `llm_params`. Fails if either ends up missing or blank.
    pub fn resolve(
        llm_identifier: Option<&str>,
        access_token: Option<&str>,
        llm_params: Option<Map<String, Value>>,
    ) -> Result<Self> {
        let extra_params = llm_params.unwrap_or_default();

        let llm_identifier = non_blank(llm_identifier)
            .or_else(|| param_str(&extra_params, MODEL_PARAM))
            .map(str::to_string);
        let access_token = non_blank(access_token)
            .or_else(|| param_str(&extra_params, ACCESS_TOKEN_PARAM))
            .map(str::to_string);

        let Some(access_token) = access_token else {
            return Err(LlmError::Configuration(
                "access token must be provided either directly or in llm_params".to_string(),
            ));
        };
        let Some(llm_identifier) = llm_identifier else {
            return Err(LlmError::Configuration(
                "llm model identifier must be provided either directly or in llm_params"
                    .to_string(),
            ));
        };

        Ok(Self {
            llm_identifier,
            access_token,
            extra_params,
        })
    }

    pub fn llm_identifier(&self) -> &str {
        &self.llm_identifier
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn extra_params(&self) -> &Map<String, Value> {
        &self.extra_params
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params = self.extra_params.clone();
        redact_secrets(&mut params);
        f.debug_struct("ClientConfig")
            .field("llm_identifier", &self.llm_identifier)
            .field("access_token", &"<redacted>")
            .field("extra_params", &params)
            .finish()
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.trim().is_empty())
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    non_blank(params.get(key).and_then(Value::as_str))
}
