use serde::{Deserialize, Serialize};

pub mod codes {
    pub const E_CFG_PARSE: &str = "E_CFG_PARSE";
    pub const E_CFG_EMPTY: &str = "E_CFG_EMPTY";
    pub const E_CFG_UNKNOWN_FIELD: &str = "E_CFG_UNKNOWN_FIELD";
    pub const W_CFG_UNKNOWN_FIELD: &str = "W_CFG_UNKNOWN_FIELD";
    pub const E_CASE_QUESTION: &str = "E_CASE_QUESTION";
    pub const E_CASE_SECURITY_REASONS: &str = "E_CASE_SECURITY_REASONS";
    pub const E_CASE_FUNCTIONAL_REASONS: &str = "E_CASE_FUNCTIONAL_REASONS";
    pub const E_CASE_EXPECTED_RESULT: &str = "E_CASE_EXPECTED_RESULT";
    pub const W_CASE_OPAQUE_EXPECTED: &str = "W_CASE_OPAQUE_EXPECTED";
    pub const W_CASE_DUPLICATE_NAME: &str = "W_CASE_DUPLICATE_NAME";
    pub const W_CASE_EMPTY_REASON: &str = "W_CASE_EMPTY_REASON";
    pub const W_CASE_SECURITY_EXPECTATIONS: &str = "W_CASE_SECURITY_EXPECTATIONS";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub source: String,
    #[serde(default)]
    pub context: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fix_steps: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            message: message.into(),
            source: "sqlgate".to_string(),
            context: serde_json::json!({}),
            fix_steps: Vec::new(),
        }
    }

    pub fn warn(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            ..Self::new(code, message)
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_fix_step(mut self, step: impl Into<String>) -> Self {
        self.fix_steps.push(step.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn format_terminal(&self) -> String {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warn => "warning",
        };
        let mut out = format!("{}[{}]: {}", label, self.code, self.message);
        if let Some(obj) = self.context.as_object() {
            if let Some(case) = obj.get("case") {
                out.push_str(&format!("\n  --> case {}", case));
            }
        }
        for step in &self.fix_steps {
            out.push_str(&format!("\n  fix: {}", step));
        }
        out
    }
}
