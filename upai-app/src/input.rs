//! Prompt batch files: a JSON array of prompt sequences, or JSON Lines with
//! one sequence per line.

use std::path::Path;
use upai_llm::PromptSequence;

pub async fn read_batch(path: &Path) -> anyhow::Result<Vec<PromptSequence>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("read input {}: {e}", path.display()))?;
    parse_batch(&contents).map_err(|e| anyhow::anyhow!("parse input {}: {e}", path.display()))
}

pub fn parse_batch(contents: &str) -> anyhow::Result<Vec<PromptSequence>> {
    let array_err = match serde_json::from_str::<Vec<PromptSequence>>(contents) {
        Ok(batch) => return Ok(batch),
        Err(e) => e,
    };

    // A document that opens with `[` but whose first line is not a complete
    // value is a multi-line array, not JSON Lines.
    let trimmed = contents.trim_start();
    let first_line = trimmed.lines().next().unwrap_or_default();
    if trimmed.starts_with('[') && serde_json::from_str::<serde_json::Value>(first_line).is_err()
    {
        return Err(anyhow::anyhow!("invalid JSON array: {array_err}"));
    }

    let mut batch = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sequence: PromptSequence = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("line {}: {e}", idx + 1))?;
        batch.push(sequence);
    }
    Ok(batch)
}
