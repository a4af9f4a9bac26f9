use crate::errors::ConfigError;
use crate::model::{EvalRequest, RegistryDocument, Settings};
use crate::registry::Registry;
use crate::validate::ValidateOptions;
use std::path::Path;
use std::time::Duration;

pub const SUPPORTED_REGISTRY_VERSION: u32 = 1;

pub const DEFAULT_PARALLEL: usize = 4;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";

/// Read and parse a registry file without validating its cases.
/// Returns the document and the paths of fields serde did not recognise.
pub fn read_registry_document(path: &Path) -> Result<(RegistryDocument, Vec<String>), ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (doc, unknown) = parse_registry_document(&raw)?;
    tracing::debug!(
        event = "registry_read",
        file = %path.display(),
        cases = doc.test_cases.len()
    );
    Ok((doc, unknown))
}

/// YAML, which also covers JSON registries.
pub fn parse_registry_document(raw: &str) -> Result<(RegistryDocument, Vec<String>), ConfigError> {
    let mut ignored = Vec::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);
    let doc: RegistryDocument = serde_ignored::deserialize(deserializer, |path| {
        ignored.push(path.to_string());
    })
    .map_err(|e| ConfigError::Parse(e.to_string()))?;

    if doc.version != 0 && doc.version != SUPPORTED_REGISTRY_VERSION {
        return Err(ConfigError::Version {
            found: doc.version,
            supported: SUPPORTED_REGISTRY_VERSION,
        });
    }
    Ok((doc, ignored))
}

/// Parse a batch evaluation request body (`{"test_cases": [...]}`).
pub fn parse_eval_request(raw: &str) -> Result<(EvalRequest, Vec<String>), ConfigError> {
    let mut ignored = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let req: EvalRequest = serde_ignored::deserialize(&mut deserializer, |path| {
        ignored.push(path.to_string());
    })
    .map_err(|e| ConfigError::Parse(e.to_string()))?;
    deserializer
        .end()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok((req, ignored))
}

pub fn load_registry(path: &Path, strict: bool) -> Result<Registry, ConfigError> {
    let (doc, unknown) = read_registry_document(path)?;
    Registry::from_document(doc, &unknown, &ValidateOptions { strict })
}

pub fn registry_from_request(raw: &str, strict: bool) -> Result<Registry, ConfigError> {
    let (req, unknown) = parse_eval_request(raw)?;
    Registry::from_document(req.into(), &unknown, &ValidateOptions { strict })
}

/// Effective harness limits.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPolicy {
    pub parallel: usize,
    pub case_timeout: Duration,
    pub deadline: Option<Duration>,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            parallel: DEFAULT_PARALLEL,
            case_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            deadline: None,
        }
    }
}

impl RunPolicy {
    /// `overrides` (CLI/env) win over `settings` (registry file), which win
    /// over defaults.
    pub fn resolve(settings: &Settings, overrides: &Settings) -> Self {
        let parallel = overrides
            .parallel
            .or(settings.parallel)
            .unwrap_or(DEFAULT_PARALLEL)
            .max(1);
        let timeout = overrides
            .timeout_seconds
            .or(settings.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
            .max(1);
        let deadline = overrides.deadline_seconds.or(settings.deadline_seconds);
        Self {
            parallel,
            case_timeout: Duration::from_secs(timeout),
            deadline: deadline.map(Duration::from_secs),
        }
    }
}
