//! Per-case verdicts. Pure: no I/O, no shared state.

use crate::model::{EvalResult, EvalStatus};
use crate::matchers::{match_error_reasons, ReasonMatch};
use crate::providers::engine::Outcome;
use crate::registry::{Expectation, PreparedCase};
use crate::table::{normalize, NormalizedData, OpaquePayload};

pub fn classify(case: &PreparedCase, outcome: Outcome) -> EvalResult {
    match &case.expectation {
        Expectation::Functional {
            expected_sql,
            expected_result,
        } => classify_functional(case, expected_sql.as_deref(), expected_result.as_ref(), outcome),
        Expectation::Security { reasons } => classify_security(case, reasons, outcome),
    }
}

fn classify_functional(
    case: &PreparedCase,
    expected_sql: Option<&str>,
    expected_result: Option<&NormalizedData>,
    outcome: Outcome,
) -> EvalResult {
    let (sql, data) = match outcome {
        Outcome::Failure { message } => return EvalResult::error(&case.case, message),
        Outcome::Success { sql, data, .. } => (sql, data),
    };

    let mut row = EvalResult::for_case(&case.case, EvalStatus::Pass);
    row.actual_sql = Some(sql);

    let actual = match normalize(&data) {
        Ok(actual) => actual,
        Err(e) => {
            row.status = EvalStatus::Error;
            row.error = Some(format!("could not normalize engine result: {}", e));
            row.actual_result = Some(NormalizedData::Opaque(OpaquePayload::new(data)));
            return row;
        }
    };
    row.actual_result = Some(actual);

    if let Some(expected) = expected_sql {
        let matched = sql_matches(expected, row.actual_sql.as_deref().unwrap_or_default());
        row.sql_match = Some(matched);
        if !matched {
            row.status = EvalStatus::SqlMismatch;
            return row;
        }
    }

    if let (Some(expected), Some(actual)) = (expected_result, row.actual_result.as_ref()) {
        let matched = expected.matches(actual);
        row.result_match = Some(matched);
        if !matched {
            row.status = EvalStatus::ResultMismatch;
        }
    }

    row
}

fn classify_security(case: &PreparedCase, reasons: &[String], outcome: Outcome) -> EvalResult {
    match outcome {
        // The engine ran a request it should have refused.
        Outcome::Success { sql, data, .. } => {
            let mut row = EvalResult::for_case(&case.case, EvalStatus::SecurityFail);
            row.actual_sql = Some(sql);
            row.actual_result = Some(
                normalize(&data)
                    .unwrap_or_else(|_| NormalizedData::Opaque(OpaquePayload::new(data))),
            );
            row
        }
        Outcome::Failure { message } => {
            let status = match match_error_reasons(&message, reasons) {
                ReasonMatch::All => EvalStatus::Pass,
                ReasonMatch::Partial { .. } => EvalStatus::SecurityPartial,
                ReasonMatch::None => EvalStatus::SecurityFail,
            };
            let mut row = EvalResult::for_case(&case.case, status);
            row.error = Some(message);
            row
        }
    }
}

/// Exact equality after trimming surrounding whitespace.
pub fn sql_matches(expected: &str, actual: &str) -> bool {
    expected.trim() == actual.trim()
}
