//! CLI argument definitions using clap

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ProbeStack - run HTTP API collections with scripted tests
#[derive(Parser, Debug, Clone)]
#[command(name = "probestack", version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,

    /// Output format for structured logging: json (JSON Lines) or text (default)
    #[arg(long = "log-format", value_name = "FORMAT", value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Config file to use instead of the default location
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Force disable colors in output
    #[arg(long = "no-color", action = ArgAction::SetTrue, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run every request of a collection in order
    Run(RunArgs),
    /// Execute a single request definition
    Send(SendArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Collection file (JSON, YAML or TOML)
    #[arg(value_name = "COLLECTION")]
    pub collection: PathBuf,

    #[command(flatten)]
    pub variables: VariableArgs,

    #[command(flatten)]
    pub execution: ExecutionArgs,

    /// Write a JUnit XML report
    #[arg(long = "report-junit", value_name = "FILE")]
    pub report_junit: Option<PathBuf>,

    /// Write a JSON report
    #[arg(long = "report-json", value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Write a TAP report
    #[arg(long = "report-tap", value_name = "FILE")]
    pub report_tap: Option<PathBuf>,

    /// Print results as JSON lines instead of the summary
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SendArgs {
    /// Request definition file (JSON, YAML or TOML)
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,

    #[command(flatten)]
    pub variables: VariableArgs,

    #[command(flatten)]
    pub execution: ExecutionArgs,

    /// Print the execution result as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Append a history entry (one JSON line) to this file
    #[arg(long = "history", value_name = "FILE")]
    pub history: Option<PathBuf>,
}

/// Variable scope selection and overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct VariableArgs {
    /// Active environment name
    #[arg(short = 'e', long = "environment", value_name = "NAME", env = "PROBESTACK_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Directory holding persisted variable scopes
    #[arg(long = "vars-dir", value_name = "DIR")]
    pub vars_dir: Option<PathBuf>,

    /// Set a variable (KEY=VALUE), may be repeated
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value, action = ArgAction::Append)]
    pub vars: Vec<(String, String)>,

    /// Persist variable changes made by scripts
    #[arg(long = "save-variables", action = ArgAction::SetTrue)]
    pub save_variables: bool,
}

/// Timeouts
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExecutionArgs {
    /// Transport timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Per-script execution budget in milliseconds
    #[arg(long = "script-timeout", value_name = "MS")]
    pub script_timeout: Option<u64>,
}

/// Log format for structured output (CI/CD)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Plain text output (default)
    #[default]
    Text,
    /// JSON Lines format for parsing
    Json,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
