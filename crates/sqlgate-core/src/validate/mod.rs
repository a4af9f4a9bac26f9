//! Registry checks. Every problem is collected, not just the first.

use crate::errors::diagnostic::codes;
use crate::errors::similarity::did_you_mean;
use crate::errors::Diagnostic;
use crate::model::{RegistryDocument, TestCase, MAX_QUESTION_LENGTH};
use crate::table::{normalize, NormalizedData};
use serde_json::json;
use std::collections::HashMap;

const KNOWN_FIELDS: &[&str] = &[
    "version",
    "settings",
    "test_cases",
    "parallel",
    "timeout_seconds",
    "deadline_seconds",
    "name",
    "question",
    "expected_sql",
    "expected_result",
    "should_pass",
    "expected_error_contains",
];

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Unknown fields become errors instead of warnings.
    pub strict: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ValidateReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidateReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }
}

pub fn validate(
    doc: &RegistryDocument,
    unknown_fields: &[String],
    opts: &ValidateOptions,
) -> ValidateReport {
    let mut diags = Vec::new();

    for path in unknown_fields {
        let leaf = path.rsplit('.').next().unwrap_or(path);
        let msg = format!(
            "unknown field '{}'{}",
            path,
            did_you_mean(leaf, KNOWN_FIELDS.iter().copied())
        );
        let d = if opts.strict {
            Diagnostic::new(codes::E_CFG_UNKNOWN_FIELD, msg)
        } else {
            Diagnostic::warn(codes::W_CFG_UNKNOWN_FIELD, msg)
        };
        diags.push(d.with_source("registry").with_context(json!({ "path": path })));
    }

    if doc.test_cases.is_empty() {
        diags.push(
            Diagnostic::new(codes::E_CFG_EMPTY, "registry has no test cases")
                .with_source("registry")
                .with_fix_step("Add at least one entry under test_cases"),
        );
    }

    let mut names: HashMap<&str, usize> = HashMap::new();
    for (i, tc) in doc.test_cases.iter().enumerate() {
        check_case(i, tc, &mut diags);
        if let Some(name) = tc.name.as_deref() {
            if let Some(first) = names.insert(name, i) {
                diags.push(
                    Diagnostic::warn(
                        codes::W_CASE_DUPLICATE_NAME,
                        format!("case name '{}' is used more than once", name),
                    )
                    .with_source("registry")
                    .with_context(json!({ "case": i + 1, "first": first + 1 })),
                );
            }
        }
    }

    ValidateReport { diagnostics: diags }
}

fn check_case(i: usize, tc: &TestCase, diags: &mut Vec<Diagnostic>) {
    let ctx = json!({ "case": i + 1, "name": tc.name });
    let label = tc.label();

    let question_len = tc.question.trim().chars().count();
    if question_len == 0 {
        diags.push(
            Diagnostic::new(codes::E_CASE_QUESTION, format!("case {} has an empty question", i + 1))
                .with_source("registry")
                .with_context(ctx.clone()),
        );
    } else if tc.question.chars().count() > MAX_QUESTION_LENGTH {
        diags.push(
            Diagnostic::new(
                codes::E_CASE_QUESTION,
                format!(
                    "{}: question is longer than {} characters",
                    label, MAX_QUESTION_LENGTH
                ),
            )
            .with_source("registry")
            .with_context(ctx.clone()),
        );
    }

    if tc.should_pass {
        if !tc.expected_error_contains.is_empty() {
            diags.push(
                Diagnostic::new(
                    codes::E_CASE_FUNCTIONAL_REASONS,
                    format!(
                        "{}: expected_error_contains is set on a case with should_pass: true",
                        label
                    ),
                )
                .with_source("registry")
                .with_context(ctx.clone())
                .with_fix_step("Set should_pass: false for a security case")
                .with_fix_step("Or remove expected_error_contains"),
            );
        }
        if let Some(expected) = &tc.expected_result {
            match normalize(expected) {
                Err(e) => diags.push(
                    Diagnostic::new(
                        codes::E_CASE_EXPECTED_RESULT,
                        format!("{}: expected_result is malformed: {}", label, e),
                    )
                    .with_source("registry")
                    .with_context(ctx.clone()),
                ),
                Ok(NormalizedData::Opaque(_)) => diags.push(
                    Diagnostic::warn(
                        codes::W_CASE_OPAQUE_EXPECTED,
                        format!(
                            "{}: expected_result is not table-shaped, so it can never match",
                            label
                        ),
                    )
                    .with_source("registry")
                    .with_context(ctx.clone())
                    .with_fix_step("Use {columns, rows} or an array of records"),
                ),
                Ok(NormalizedData::Table(_)) => {}
            }
        }
    } else {
        if tc.expected_error_contains.is_empty() {
            diags.push(
                Diagnostic::new(
                    codes::E_CASE_SECURITY_REASONS,
                    format!(
                        "{}: should_pass is false but expected_error_contains is empty",
                        label
                    ),
                )
                .with_source("registry")
                .with_context(ctx.clone())
                .with_fix_step("List the substrings the rejection message must mention"),
            );
        }
        if tc.expected_error_contains.iter().any(|r| r.trim().is_empty()) {
            diags.push(
                Diagnostic::warn(
                    codes::W_CASE_EMPTY_REASON,
                    format!("{}: blank entry in expected_error_contains matches anything", label),
                )
                .with_source("registry")
                .with_context(ctx.clone()),
            );
        }
        let mut ignored = Vec::new();
        if tc.expected_sql.is_some() {
            ignored.push("expected_sql");
        }
        if tc.expected_result.is_some() {
            ignored.push("expected_result");
        }
        if !ignored.is_empty() {
            diags.push(
                Diagnostic::warn(
                    codes::W_CASE_SECURITY_EXPECTATIONS,
                    format!(
                        "{}: {} ignored on a case with should_pass: false",
                        label,
                        ignored.join(", ")
                    ),
                )
                .with_source("registry")
                .with_context(ctx)
                .with_fix_step("Remove it, or set should_pass: true for a functional case"),
            );
        }
    }
}
