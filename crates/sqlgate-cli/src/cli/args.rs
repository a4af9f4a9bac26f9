use clap::{Parser, Subcommand, ValueEnum};
use sqlgate_core::model::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqlgate",
    version,
    about = "Functional and security evals for natural-language-to-SQL engines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    /// tracing filter, e.g. "info" or "sqlgate_core=debug"
    #[arg(long, global = true, default_value = "warn", env = "SQLGATE_LOG")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a registry file against the engine and print a report
    Run(RunArgs),
    /// Read a batch evaluation request, write the batch evaluation response
    Eval(EvalArgs),
    /// Check a registry file without contacting the engine
    Validate(ValidateArgs),
    /// Write a sample registry with the default battery
    Init(InitArgs),
    Version,
}

#[derive(clap::Args, Clone, Debug)]
pub struct EngineArgs {
    /// Base URL of the query engine (queries go to <url>/query)
    #[arg(long, env = "SQLGATE_ENGINE_URL", default_value = sqlgate_core::config::DEFAULT_ENGINE_URL)]
    pub engine_url: String,

    /// Answer from recorded outcomes (JSONL) instead of a live engine; wins over --engine-url
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct HarnessArgs {
    /// Maximum cases in flight at once
    #[arg(long, env = "SQLGATE_PARALLEL")]
    pub parallel: Option<usize>,

    /// Per-case engine deadline
    #[arg(long, env = "SQLGATE_TIMEOUT_SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Whole-run deadline; unfinished cases are reported as errors
    #[arg(long, env = "SQLGATE_DEADLINE_SECONDS")]
    pub deadline_seconds: Option<u64>,
}

impl HarnessArgs {
    pub fn as_settings(&self) -> Settings {
        Settings {
            parallel: self.parallel,
            timeout_seconds: self.timeout_seconds,
            deadline_seconds: self.deadline_seconds,
        }
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct RunArgs {
    #[arg(long, default_value = "sqlgate.yaml")]
    pub registry: PathBuf,

    /// unknown registry fields are errors
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub harness: HarnessArgs,

    /// write the JSON summary here ("-" for stdout)
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// write a JUnit XML report here
    #[arg(long)]
    pub junit: Option<PathBuf>,
}

#[derive(clap::Args, Clone, Debug)]
pub struct EvalArgs {
    /// request body file; stdin when omitted
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub harness: HarnessArgs,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ValidateArgs {
    #[arg(long, default_value = "sqlgate.yaml")]
    pub registry: PathBuf,

    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args, Clone, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = "sqlgate.yaml")]
    pub registry: PathBuf,

    /// overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
