//! CLI command handlers. Each returns the text to print on stdout.

use crate::config::UpaiConfig;
use crate::input;
use std::path::Path;
use upai_llm::{API_BASE_PARAM, DEFAULT_API_BASE, ResultRecord};

#[tracing::instrument(level = "info", skip(cfg, debug))]
pub async fn run(
    cfg: &UpaiConfig,
    input_path: &Path,
    model: Option<&str>,
    debug: bool,
) -> anyhow::Result<String> {
    let adapter = cfg.adapter(model)?;
    let batch = input::read_batch(input_path).await?;

    let records = adapter.process_batch(&batch, debug).await;
    let failed = records.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        tracing::warn!(failed, total = records.len(), "batch finished with failures");
    } else {
        tracing::info!(total = records.len(), "batch finished");
    }

    render_records(&records)
}

#[tracing::instrument(level = "info", skip(cfg))]
pub async fn payload(
    cfg: &UpaiConfig,
    input_path: &Path,
    model: Option<&str>,
) -> anyhow::Result<String> {
    let adapter = cfg.adapter(model)?;
    let batch = input::read_batch(input_path).await?;
    let payload = adapter.build_payload(&batch).redacted();
    Ok(serde_json::to_string_pretty(&payload)?)
}

pub fn check(cfg: &UpaiConfig, model: Option<&str>) -> anyhow::Result<String> {
    let adapter = cfg.adapter(model)?;
    let params = adapter.config().extra_params();
    let api_base = params
        .get(API_BASE_PARAM)
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_API_BASE);
    let keys: Vec<&str> = params.keys().map(String::as_str).collect();
    Ok(format!(
        "model={}\napi_base={}\nparams={}",
        adapter.llm_identifier(),
        api_base,
        keys.join(",")
    ))
}

fn render_records(records: &[ResultRecord]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
