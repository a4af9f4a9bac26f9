use crate::model::EvalSummary;
use anyhow::Context;
use std::path::Path;

/// The batch evaluation response body.
pub fn to_json_string(summary: &EvalSummary) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn write_json(summary: &EvalSummary, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, to_json_string(summary)?)
        .with_context(|| format!("failed to write {}", out.display()))
}
