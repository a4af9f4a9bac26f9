use crate::model::{EvalStatus, EvalSummary};
use std::path::Path;

pub fn render_junit(suite: &str, summary: &EvalSummary) -> String {
    let errors = summary.count(EvalStatus::Error);
    let failures = summary.failed - errors;

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="{}" tests="{}" failures="{}" errors="{}" timestamp="{}">"#,
        escape(suite),
        summary.total,
        failures,
        errors,
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S")
    ));
    xml.push('\n');

    for r in &summary.results {
        let time = r
            .duration_ms
            .map(|d| format!(r#" time="{:.3}""#, d as f64 / 1000.0))
            .unwrap_or_default();
        let classname = if r.security { "security" } else { "functional" };
        xml.push_str(&format!(
            r#"  <testcase classname="{}" name="{}"{}>"#,
            classname,
            escape(r.label()),
            time
        ));
        let detail = r.error.as_deref().unwrap_or(r.status.as_str());
        match r.status {
            EvalStatus::Pass => {}
            EvalStatus::Error => xml.push_str(&format!(
                r#"<error message="{}"/>"#,
                escape(detail)
            )),
            EvalStatus::SecurityPartial => xml.push_str(&format!(
                r#"<failure type="security_partial" message="{}"/><system-out>SECURITY PARTIAL: review manually</system-out>"#,
                escape(detail)
            )),
            EvalStatus::SqlMismatch | EvalStatus::ResultMismatch | EvalStatus::SecurityFail => {
                xml.push_str(&format!(
                    r#"<failure type="{}" message="{}"/>"#,
                    r.status,
                    escape(detail)
                ))
            }
        }
        xml.push_str("</testcase>\n");
    }

    xml.push_str("</testsuite>\n");
    xml
}

pub fn write_junit(suite: &str, summary: &EvalSummary, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, render_junit(suite, summary))?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
