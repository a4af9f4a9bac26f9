use crate::model::{EvalResult, EvalStatus, EvalSummary};
use std::io::{self, Write};

const RULE: &str = "======================================================================";

pub fn print_summary(summary: &EvalSummary) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    // A closed stderr is not worth failing the run over.
    let _ = write_summary(&mut out, summary);
}

pub fn write_summary<W: Write>(out: &mut W, summary: &EvalSummary) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Total evals: {}", summary.total)?;
    writeln!(out, "Passed: {}", summary.passed)?;
    writeln!(out, "Failed: {}", summary.failed)?;

    let (security, functional): (Vec<&EvalResult>, Vec<&EvalResult>) =
        summary.results.iter().partition(|r| r.security);
    if !security.is_empty() || !functional.is_empty() {
        writeln!(out)?;
    }
    if !security.is_empty() {
        let passed = security.iter().filter(|r| r.status.is_pass()).count();
        writeln!(
            out,
            "Security Tests: {} total, {} passed, {} failed",
            security.len(),
            passed,
            security.len() - passed
        )?;
    }
    if !functional.is_empty() {
        let passed = functional.iter().filter(|r| r.status.is_pass()).count();
        writeln!(
            out,
            "Functional Tests: {} total, {} passed, {} failed",
            functional.len(),
            passed,
            functional.len() - passed
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "DETAILED RESULTS")?;
    writeln!(out, "{}", RULE)?;

    for (i, r) in summary.results.iter().enumerate() {
        write_result(out, i + 1, r)?;
    }

    writeln!(out, "\n{}", RULE)?;
    if summary.failed > 0 {
        writeln!(out, "FAILED: {} eval(s) failed", summary.failed)?;
    } else {
        writeln!(out, "SUCCESS: All evals passed!")?;
    }
    Ok(())
}

fn write_result<W: Write>(out: &mut W, n: usize, r: &EvalResult) -> io::Result<()> {
    let prefix = match r.status {
        EvalStatus::Pass => "[PASS]",
        EvalStatus::SecurityFail => "[SECURITY FAIL]",
        EvalStatus::SecurityPartial => "[SECURITY PARTIAL]",
        EvalStatus::Error | EvalStatus::SqlMismatch | EvalStatus::ResultMismatch => "[FAIL]",
    };
    let duration = r
        .duration_ms
        .map(|d| format!(" ({:.1}s)", d as f64 / 1000.0))
        .unwrap_or_default();

    writeln!(out, "\n{}. {} {}{}", n, prefix, shorten(r.label(), 60), duration)?;
    writeln!(out, "   Status: {}", r.status)?;
    if let Some(sql) = &r.expected_sql {
        writeln!(out, "   Expected SQL: {}", sql)?;
    }
    if let Some(sql) = &r.actual_sql {
        writeln!(out, "   Actual SQL:   {}", sql)?;
    }
    if let Some(m) = r.sql_match {
        writeln!(out, "   SQL Match: {}", if m { "MATCH" } else { "NO MATCH" })?;
    }
    if let Some(m) = r.result_match {
        writeln!(out, "   Result Match: {}", if m { "MATCH" } else { "NO MATCH" })?;
    }
    if let Some(err) = &r.error {
        writeln!(out, "   Error: {}", shorten(err, 200))?;
    }
    match r.actual_result.as_ref() {
        Some(data) => match data.as_table() {
            Some(t) => writeln!(out, "   Result: {} rows returned", t.row_count())?,
            None => writeln!(out, "   Result: (unrecognized shape, shown as-is)")?,
        },
        None => {}
    }
    Ok(())
}

/// At most `max` characters, ending in "..." when cut.
fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", keep)
}
