//! The ordered, immutable battery a run executes.

use crate::errors::{diagnostic::codes, ConfigError, Diagnostic};
use crate::model::{RegistryDocument, Settings, TestCase};
use crate::table::{normalize, NormalizedData};
use crate::validate::{validate, ValidateOptions};
use std::sync::Arc;

/// What a case expects, resolved once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Functional {
        expected_sql: Option<String>,
        expected_result: Option<NormalizedData>,
    },
    Security {
        reasons: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCase {
    pub case: TestCase,
    pub expectation: Expectation,
}

impl PreparedCase {
    /// Resolve expectations. Assumes the case already passed validation; a
    /// malformed expected table still surfaces as an error here.
    pub fn prepare(case: TestCase) -> Result<Self, ConfigError> {
        let expectation = if case.should_pass {
            let expected_result = match &case.expected_result {
                Some(v) => Some(normalize(v).map_err(|e| {
                    ConfigError::Invalid(vec![Diagnostic::new(
                        codes::E_CASE_EXPECTED_RESULT,
                        format!("{}: expected_result is malformed: {}", case.label(), e),
                    )])
                })?),
                None => None,
            };
            Expectation::Functional {
                expected_sql: case.expected_sql.clone(),
                expected_result,
            }
        } else {
            Expectation::Security {
                reasons: case.expected_error_contains.clone(),
            }
        };
        Ok(Self { case, expectation })
    }

    pub fn is_security(&self) -> bool {
        matches!(self.expectation, Expectation::Security { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    cases: Vec<Arc<PreparedCase>>,
    settings: Settings,
}

impl Registry {
    /// Validate and prepare a document. Warnings are logged; any error
    /// rejects the whole registry with every problem listed.
    pub fn from_document(
        doc: RegistryDocument,
        unknown_fields: &[String],
        opts: &ValidateOptions,
    ) -> Result<Self, ConfigError> {
        let report = validate(&doc, unknown_fields, opts);
        if report.has_errors() {
            return Err(ConfigError::Invalid(report.diagnostics));
        }
        for d in report.warnings() {
            tracing::warn!(event = "registry_warning", code = %d.code, "{}", d.message);
        }

        let cases = doc
            .test_cases
            .into_iter()
            .map(|tc| PreparedCase::prepare(tc).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cases,
            settings: doc.settings,
        })
    }

    pub fn from_cases(cases: Vec<TestCase>) -> Result<Self, ConfigError> {
        let doc = RegistryDocument {
            test_cases: cases,
            ..RegistryDocument::default()
        };
        Self::from_document(doc, &[], &ValidateOptions::default())
    }

    pub fn cases(&self) -> &[Arc<PreparedCase>] {
        &self.cases
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}
