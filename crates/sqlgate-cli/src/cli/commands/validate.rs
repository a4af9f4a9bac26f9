use sqlgate_core::config::read_registry_document;
use sqlgate_core::errors::Diagnostic;
use sqlgate_core::validate::{validate, ValidateOptions, ValidateReport};
use serde_json::json;

use super::exit_codes;
use crate::cli::args::{OutputFormat, ValidateArgs};

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let report = match read_registry_document(&args.registry) {
        Ok((doc, unknown)) => validate(
            &doc,
            &unknown,
            &ValidateOptions {
                strict: args.strict,
            },
        ),
        Err(e) => ValidateReport {
            diagnostics: e.diagnostics(),
        },
    };

    print_report(&report, args.format);

    if report.has_errors() {
        Ok(exit_codes::CONFIG_ERROR)
    } else {
        Ok(exit_codes::OK)
    }
}

fn print_report(report: &ValidateReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let errors: Vec<&Diagnostic> = report.errors().collect();
            let warnings: Vec<&Diagnostic> = report.warnings().collect();
            let output = json!({
                "schema_version": 1,
                "ok": errors.is_empty(),
                "errors": errors,
                "warnings": warnings,
                "summary": {
                    "diagnostic_count": report.diagnostics.len()
                }
            });
            match serde_json::to_string_pretty(&output) {
                Ok(s) => println!("{}", s),
                Err(e) => eprintln!("failed to render report: {}", e),
            }
        }
        OutputFormat::Text => {
            for d in &report.diagnostics {
                eprintln!("{}", d.format_terminal());
            }
            let errors = report.errors().count();
            let warnings = report.warnings().count();
            if errors == 0 {
                if warnings > 0 {
                    eprintln!("Registry is valid ({} warning(s)).", warnings);
                } else {
                    eprintln!("Registry is valid.");
                }
            } else {
                eprintln!(
                    "Registry has {} error(s) and {} warning(s).",
                    errors, warnings
                );
            }
        }
    }
}
