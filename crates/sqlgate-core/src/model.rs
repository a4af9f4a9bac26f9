use crate::table::NormalizedData;
use serde::{Deserialize, Serialize};

/// Longest question the engine accepts.
pub const MAX_QUESTION_LENGTH: usize = 1000;

/// On-disk registry: optional settings plus the ordered battery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "is_default_settings")]
    pub settings: Settings,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// Batch evaluation request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalRequest {
    pub test_cases: Vec<TestCase>,
}

impl From<EvalRequest> for RegistryDocument {
    fn from(req: EvalRequest) -> Self {
        RegistryDocument {
            version: 0,
            settings: Settings::default(),
            test_cases: req.test_cases,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_seconds: Option<u64>,
}

fn is_default_settings(s: &Settings) -> bool {
    s == &Settings::default()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_sql: Option<String>,
    /// Any shape the normalizer understands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<serde_json::Value>,
    #[serde(default = "default_should_pass")]
    pub should_pass: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_error_contains: Vec<String>,
}

fn default_should_pass() -> bool {
    true
}

impl TestCase {
    pub fn functional(question: impl Into<String>) -> Self {
        Self {
            name: None,
            question: question.into(),
            expected_sql: None,
            expected_result: None,
            should_pass: true,
            expected_error_contains: Vec::new(),
        }
    }

    pub fn security<I, S>(question: impl Into<String>, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            should_pass: false,
            expected_error_contains: reasons.into_iter().map(Into::into).collect(),
            ..Self::functional(question)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_expected_sql(mut self, sql: impl Into<String>) -> Self {
        self.expected_sql = Some(sql.into());
        self
    }

    pub fn with_expected_result(mut self, result: serde_json::Value) -> Self {
        self.expected_result = Some(result);
        self
    }

    /// Name if set, otherwise the question.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.question)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EvalStatus {
    Pass,
    Error,
    SqlMismatch,
    ResultMismatch,
    SecurityFail,
    SecurityPartial,
}

impl EvalStatus {
    pub const ALL: [EvalStatus; 6] = [
        EvalStatus::Pass,
        EvalStatus::Error,
        EvalStatus::SqlMismatch,
        EvalStatus::ResultMismatch,
        EvalStatus::SecurityFail,
        EvalStatus::SecurityPartial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvalStatus::Pass => "pass",
            EvalStatus::Error => "error",
            EvalStatus::SqlMismatch => "sql_mismatch",
            EvalStatus::ResultMismatch => "result_mismatch",
            EvalStatus::SecurityFail => "security_fail",
            EvalStatus::SecurityPartial => "security_partial",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, EvalStatus::Pass)
    }
}

impl std::fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalResult {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_sql: Option<String>,
    pub status: EvalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_result: Option<NormalizedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    // Presentation-only, not part of the wire shape.
    #[serde(skip)]
    pub security: bool,
    #[serde(skip)]
    pub duration_ms: Option<u64>,
}

impl EvalResult {
    pub fn for_case(case: &TestCase, status: EvalStatus) -> Self {
        Self {
            question: case.question.clone(),
            name: case.name.clone(),
            expected_sql: case.expected_sql.clone(),
            status,
            actual_sql: None,
            actual_result: None,
            sql_match: None,
            result_match: None,
            error: None,
            security: !case.should_pass,
            duration_ms: None,
        }
    }

    pub fn error(case: &TestCase, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::for_case(case, EvalStatus::Error)
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.question)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<EvalResult>,
}

impl EvalSummary {
    pub fn from_results(results: Vec<EvalResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.status.is_pass()).count();
        Self {
            total,
            passed,
            failed: total - passed,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn count(&self, status: EvalStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Query submission body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Successful query submission answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub sql: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_to_wire_names() {
        let names: Vec<String> = EvalStatus::ALL
            .iter()
            .map(|s| serde_json::to_value(s).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            ["pass", "error", "sql_mismatch", "result_mismatch", "security_fail", "security_partial"]
        );
        for s in EvalStatus::ALL {
            assert_eq!(serde_json::to_value(s).unwrap(), json!(s.as_str()));
        }
    }

    #[test]
    fn should_pass_defaults_to_true() {
        let tc: TestCase = serde_json::from_value(json!({"question": "q"})).unwrap();
        assert!(tc.should_pass);
        assert!(tc.expected_error_contains.is_empty());
    }

    #[test]
    fn result_omits_absent_fields_and_presentation_data() {
        let mut r = EvalResult::for_case(&TestCase::functional("q"), EvalStatus::Pass);
        r.duration_ms = Some(12);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, json!({"question": "q", "status": "pass"}));
    }

    #[test]
    fn summary_totals_add_up() {
        let tc = TestCase::functional("q");
        let s = EvalSummary::from_results(vec![
            EvalResult::for_case(&tc, EvalStatus::Pass),
            EvalResult::for_case(&tc, EvalStatus::SecurityPartial),
            EvalResult::error(&tc, "boom"),
        ]);
        assert_eq!((s.total, s.passed, s.failed), (3, 1, 2));
        assert_eq!(s.total, s.passed + s.failed);
        assert!(!s.all_passed());
        assert_eq!(s.count(EvalStatus::Error), 1);
    }

    #[test]
    fn query_response_data_is_optional() {
        let r: QueryResponse = serde_json::from_value(json!({"sql": "SELECT 1"})).unwrap();
        assert!(r.data.is_null());
        assert!(r.warning.is_none());
    }
}
