//! upai configuration loader.
//!
//! A TOML file (optional when using the default location) plus environment
//! overrides. Required fields are validated by `RequestAdapter` construction.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use upai_llm::{API_BASE_PARAM, MODEL_PARAM, RequestAdapter};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpaiConfig {
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    /// Passed through verbatim into every request payload.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl UpaiConfig {
    /// Load `path`, or the default location if none is given. A missing
    /// default file yields an empty config; a missing explicit file is an error.
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(default_config_path);

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::parse(&contents)
                .map_err(|e| anyhow::anyhow!("parse config {}: {e}", path.display()))?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using environment only");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("read config {}: {e}", path.display())),
        };

        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("UPAI_MODEL") {
            if self.llm.params.contains_key(MODEL_PARAM) {
                self.llm
                    .params
                    .insert(MODEL_PARAM.to_string(), Value::String(v.clone()));
            }
            self.llm.model = Some(v);
        }
        if let Some(v) = get("UPAI_ACCESS_TOKEN") {
            self.llm.access_token = Some(v);
        } else if self.llm.access_token.is_none() {
            if let Some(v) = get("OPENAI_API_KEY") {
                self.llm.access_token = Some(v);
            }
        }
        if let Some(v) = get("UPAI_API_BASE") {
            self.llm
                .params
                .insert(API_BASE_PARAM.to_string(), Value::String(v));
        }
    }

    /// Build the adapter; `model_override` (from the command line) wins over
    /// everything else, including a `model` entry in `params`.
    pub fn adapter(&self, model_override: Option<&str>) -> anyhow::Result<RequestAdapter> {
        let mut params = self.llm.params.clone();
        if let Some(model) = model_override {
            params.insert(MODEL_PARAM.to_string(), Value::String(model.to_string()));
        }
        let model = model_override.or(self.llm.model.as_deref());
        let adapter =
            RequestAdapter::new(model, self.llm.access_token.as_deref(), Some(params))?;
        Ok(adapter)
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".upai").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("upai-{name}-{}.toml", Uuid::new_v4()))
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_model_token_and_params() {
        let cfg = UpaiConfig::parse(
            r#"
[llm]
model = "gpt-4o-mini"
access_token = "sk-test"

[llm.params]
max_tokens = 512
temperature = 0.3
"#,
        )
        .expect("parse config");

        assert_eq!(cfg.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cfg.llm.access_token.as_deref(), Some("sk-test"));
        assert_eq!(cfg.llm.params.get("max_tokens"), Some(&json!(512)));
        assert_eq!(cfg.llm.params.get("temperature"), Some(&json!(0.3)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = UpaiConfig::parse(
            r#"
[llm]
model = "from-file"
access_token = "file-token"
"#,
        )
        .expect("parse config");

        cfg.apply_env_overrides(env(&[
            ("UPAI_MODEL", "from-env"),
            ("UPAI_ACCESS_TOKEN", "env-token"),
            ("UPAI_API_BASE", "http://localhost:4000/v1"),
        ]));

        assert_eq!(cfg.llm.model.as_deref(), Some("from-env"));
        assert_eq!(cfg.llm.access_token.as_deref(), Some("env-token"));
        assert_eq!(
            cfg.llm.params.get("api_base"),
            Some(&json!("http://localhost:4000/v1"))
        );
    }

    #[test]
    fn openai_key_is_only_a_fallback() {
        let mut cfg = UpaiConfig::default();
        cfg.apply_env_overrides(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(cfg.llm.access_token.as_deref(), Some("sk-openai"));

        let mut cfg = UpaiConfig::parse("[llm]\naccess_token = \"file\"\n").expect("parse");
        cfg.apply_env_overrides(env(&[("OPENAI_API_KEY", "sk-openai"), ("UPAI_MODEL", " ")]));
        assert_eq!(cfg.llm.access_token.as_deref(), Some("file"));
        assert_eq!(cfg.llm.model, None);
    }

    #[test]
    fn adapter_uses_params_fallbacks_and_cli_override() {
        let cfg = UpaiConfig::parse(
            r#"
[llm.params]
model = "param-model"
access_token = "param-token"
"#,
        )
        .expect("parse config");

        let adapter = cfg.adapter(None).expect("adapter from params");
        assert_eq!(adapter.llm_identifier(), "param-model");
        assert_eq!(adapter.access_token(), "param-token");

        let adapter = cfg.adapter(Some("cli-model")).expect("adapter with override");
        assert_eq!(adapter.llm_identifier(), "cli-model");
        assert_eq!(adapter.build_payload(&[]).model(), Some("cli-model"));
    }

    #[test]
    fn env_model_replaces_params_model() {
        let mut cfg = UpaiConfig::parse(
            r#"
[llm]
access_token = "T"

[llm.params]
model = "param-model"
"#,
        )
        .expect("parse config");

        cfg.apply_env_overrides(env(&[("UPAI_MODEL", "env-model")]));

        assert_eq!(cfg.llm.params.get("model"), Some(&json!("env-model")));
        let adapter = cfg.adapter(None).expect("adapter");
        assert_eq!(adapter.llm_identifier(), "env-model");
        assert_eq!(adapter.build_payload(&[]).model(), Some("env-model"));
    }

    #[test]
    fn env_model_does_not_add_params_model() {
        let mut cfg = UpaiConfig::default();
        cfg.apply_env_overrides(env(&[("UPAI_MODEL", "env-model")]));
        assert!(cfg.llm.params.get("model").is_none());
    }

    #[test]
    fn adapter_without_token_fails() {
        let cfg = UpaiConfig::parse("[llm]\nmodel = \"m\"\n").expect("parse");
        let err = cfg.adapter(None).expect_err("token required");
        assert!(err.to_string().contains("access token"));
    }

    #[tokio::test]
    async fn load_reads_explicit_file() {
        let path = temp_path("cfg-load");
        tokio::fs::write(&path, "[llm]\nmodel = \"m\"\naccess_token = \"t\"\n")
            .await
            .expect("write config");

        let cfg = UpaiConfig::load(Some(path.clone()))
            .await
            .expect("load config");
        assert!(cfg.llm.model.is_some());
        assert!(cfg.llm.access_token.is_some());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn load_rejects_missing_explicit_file() {
        let path = temp_path("cfg-missing");
        let err = UpaiConfig::load(Some(path))
            .await
            .expect_err("missing explicit file");
        assert!(err.to_string().contains("read config"));
    }

    #[tokio::test]
    async fn load_reports_parse_errors_with_path() {
        let path = temp_path("cfg-bad");
        tokio::fs::write(&path, "[llm\nmodel = ")
            .await
            .expect("write config");

        let err = UpaiConfig::load(Some(path.clone()))
            .await
            .expect_err("invalid toml");
        assert!(err.to_string().contains("parse config"));

        let _ = std::fs::remove_file(path);
    }
}
