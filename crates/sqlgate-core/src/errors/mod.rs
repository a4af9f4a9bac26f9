pub mod diagnostic;
pub mod similarity;

pub use diagnostic::{Diagnostic, Severity};

use std::path::PathBuf;

/// Registry problems that make a run meaningless. These are the only errors
/// allowed to abort a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read registry {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse registry: {0}")]
    Parse(String),
    #[error("unsupported registry version {found} (supported: 0, {supported})")]
    Version { found: u32, supported: u32 },
    #[error("invalid registry: {}", render_problems(.0))]
    Invalid(Vec<Diagnostic>),
}

impl ConfigError {
    /// Every problem behind this error as diagnostics, for `validate` style output.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            ConfigError::Invalid(diags) => diags.clone(),
            ConfigError::Read { path, .. } => vec![Diagnostic::new(
                diagnostic::codes::E_CFG_PARSE,
                self.to_string(),
            )
            .with_source("registry")
            .with_context(serde_json::json!({ "file": path }))],
            ConfigError::Parse(_) | ConfigError::Version { .. } => vec![Diagnostic::new(
                diagnostic::codes::E_CFG_PARSE,
                self.to_string(),
            )
            .with_source("registry")],
        }
    }
}

fn render_problems(diags: &[Diagnostic]) -> String {
    let errors: Vec<&str> = diags
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.as_str())
        .collect();
    format!(
        "{} problem{}: {}",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" },
        errors.join("; ")
    )
}

/// The engine call for one case failed. Always contained to that case.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx answer. The message is the engine's own text, unprefixed,
    /// because security cases match reasons against it.
    #[error("{0}")]
    Rejected(String),
    #[error("malformed engine response: {0}")]
    Malformed(String),
    #[error("engine call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// A payload claimed a tabular shape but broke the table invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("row {row} has {found} cells but the table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}
