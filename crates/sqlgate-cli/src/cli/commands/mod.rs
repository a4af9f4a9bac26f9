pub mod validate;

use crate::cli::args::*;
use sqlgate_core::config::{load_registry, registry_from_request, RunPolicy};
use sqlgate_core::engine::runner::Runner;
use sqlgate_core::errors::ConfigError;
use sqlgate_core::model::EvalSummary;
use sqlgate_core::providers::engine::http::HttpEngine;
use sqlgate_core::providers::engine::replay::ReplayEngine;
use sqlgate_core::providers::engine::QueryEngine;
use sqlgate_core::registry::Registry;
use sqlgate_core::report;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const TEST_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => cmd_run(args).await,
        Command::Eval(args) => cmd_eval(args).await,
        Command::Validate(args) => validate::run(args),
        Command::Init(args) => cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn build_engine(args: &EngineArgs) -> anyhow::Result<Arc<dyn QueryEngine>> {
    if let Some(path) = &args.replay {
        let engine = ReplayEngine::from_path(path)?;
        tracing::info!(
            event = "engine_selected",
            engine = "replay",
            file = %path.display(),
            recorded = engine.len()
        );
        return Ok(Arc::new(engine));
    }
    let engine = HttpEngine::new(&args.engine_url)?;
    tracing::info!(event = "engine_selected", engine = "http", url = %args.engine_url);
    Ok(Arc::new(engine))
}

fn report_config_error(e: &ConfigError) -> i32 {
    for d in e.diagnostics() {
        eprintln!("{}", d.format_terminal());
    }
    eprintln!("config error: {}", e);
    exit_codes::CONFIG_ERROR
}

async fn execute(registry: &Registry, engine: &EngineArgs, harness: &HarnessArgs) -> anyhow::Result<EvalSummary> {
    let engine = build_engine(engine)?;
    let policy = RunPolicy::resolve(registry.settings(), &harness.as_settings());
    let runner = Runner::new(engine, policy);
    Ok(runner.run_suite(registry).await)
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let registry = match load_registry(&args.registry, args.strict) {
        Ok(r) => r,
        Err(e) => return Ok(report_config_error(&e)),
    };

    let summary = execute(&registry, &args.engine, &args.harness).await?;

    report::console::print_summary(&summary);

    if let Some(out) = &args.json {
        if out == Path::new("-") {
            println!("{}", report::json::to_json_string(&summary)?);
        } else {
            report::json::write_json(&summary, out)?;
            eprintln!("wrote {}", out.display());
        }
    }
    if let Some(out) = &args.junit {
        report::junit::write_junit("sqlgate", &summary, out)?;
        eprintln!("wrote {}", out.display());
    }

    Ok(if summary.all_passed() {
        exit_codes::OK
    } else {
        exit_codes::TEST_FAILED
    })
}

async fn cmd_eval(args: EvalArgs) -> anyhow::Result<i32> {
    let raw = match &args.input {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let registry = match registry_from_request(&raw, args.strict) {
        Ok(r) => r,
        Err(e) => return Ok(report_config_error(&e)),
    };

    let summary = execute(&registry, &args.engine, &args.harness).await?;
    println!("{}", report::json::to_json_string(&summary)?);

    // The response body is the product here; per-case failures live inside it.
    Ok(exit_codes::OK)
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if args.registry.exists() && !args.force {
        eprintln!(
            "note: {} already exists (use --force to overwrite)",
            args.registry.display()
        );
        return Ok(exit_codes::OK);
    }
    if let Some(parent) = args.registry.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.registry, crate::templates::SAMPLE_REGISTRY)?;
    eprintln!("created {}", args.registry.display());
    Ok(exit_codes::OK)
}
