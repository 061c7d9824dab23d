//! Command dispatch for the `probestack` binary

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command, ExecutionArgs, LogFormat, RunArgs, SendArgs, VariableArgs};
use crate::client::ReqwestTransport;
use crate::config::Config;
use crate::errors::ProbestackError;
use crate::models::{HistoryEntry, RunReport, RunStatus};
use crate::output::{format_execution_result, format_run_report, format_run_report_json, Style};
use crate::pipeline::{
    generate_report, load_collection, load_request, CollectionRunner, ReportConfig, ReportFormat,
    RequestExecutor, RunProgress,
};
use crate::scripting::ScriptSandbox;
use crate::status::ExitStatus;
use crate::variables::{JsonFilePersistence, Scope, VariableStore};

/// Main entry point for the CLI.
///
/// Parses arguments, loads configuration, installs logging and dispatches
/// to the requested command.
pub fn run(args: Vec<String>) -> ExitStatus {
    let parsed = match Args::try_parse_from(&args) {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                ExitStatus::Success
            } else {
                ExitStatus::Error
            };
        }
    };

    init_logging(parsed.verbose, parsed.log_format.unwrap_or_default());

    let config = match &parsed.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => return handle_error(e),
        },
        None => match Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: Failed to load config: {}", e);
                Config::default()
            }
        },
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return handle_error(ProbestackError::Io(e)),
    };

    match runtime.block_on(program(parsed, config)) {
        Ok(status) => status,
        Err(e) => handle_error(e),
    }
}

pub async fn program(args: Args, config: Config) -> Result<ExitStatus, ProbestackError> {
    let style = if args.no_color { Style::plain() } else { Style::detect() };
    match args.command {
        Command::Run(run) => run_command(run, &config, style).await,
        Command::Send(send) => send_command(send, &config, style).await,
    }
}

/// Install the tracing subscriber on stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // Ignore the error if a subscriber is already installed
    let _ = match format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn build_executor(
    execution: &ExecutionArgs,
    config: &Config,
) -> Result<RequestExecutor<ReqwestTransport>, ProbestackError> {
    let timeout = execution
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.timeout());
    let budget = execution
        .script_timeout
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.script_budget());
    debug!(timeout_ms = timeout.as_millis() as u64, budget_ms = budget.as_millis() as u64, "building executor");

    let transport = ReqwestTransport::new(timeout)?;
    Ok(RequestExecutor::with_sandbox(transport, ScriptSandbox::new(budget)))
}

/// Seed the store from persistence, then apply `--var` overrides.
///
/// Overrides land in the environment scope when an environment is active so
/// they take precedence during resolution.
fn load_variables(
    opts: &VariableArgs,
    config: &Config,
) -> Result<(VariableStore, JsonFilePersistence), ProbestackError> {
    let environment = opts.environment.clone().or_else(|| config.environment.clone());
    let mut store = match environment {
        Some(name) => VariableStore::with_environment(name),
        None => VariableStore::new(),
    };

    let dir = opts.vars_dir.clone().unwrap_or_else(|| config.variables_dir.clone());
    let persistence = JsonFilePersistence::new(dir);
    store.load_from(&persistence)?;

    let scope = if store.environment_name().is_some() {
        Scope::Environment
    } else {
        Scope::Global
    };
    for (key, value) in &opts.vars {
        store.set(scope, key.as_str(), value.as_str());
    }

    Ok((store, persistence))
}

fn save_variables(
    opts: &VariableArgs,
    store: &VariableStore,
    persistence: &JsonFilePersistence,
) -> Result<(), ProbestackError> {
    if opts.save_variables {
        store.save_to(persistence)?;
        info!(dir = %persistence.dir().display(), "variables saved");
    }
    Ok(())
}

async fn run_command(args: RunArgs, config: &Config, style: Style) -> Result<ExitStatus, ProbestackError> {
    let collection = load_collection(&args.collection)?;
    let (mut vars, persistence) = load_variables(&args.variables, config)?;
    let runner = CollectionRunner::new(build_executor(&args.execution, config)?);

    let show_progress = !args.json && std::io::stderr().is_terminal();
    let progress_task = show_progress.then(|| spawn_progress_bar(runner.subscribe(), collection.request_count()));

    let report = runner.run_collection(&collection, &mut vars).await;

    if let Some(task) = progress_task {
        let _ = task.await;
    }

    if args.json {
        print!("{}", format_run_report_json(&report));
    } else {
        print!("{}", format_run_report(&report, &style));
    }

    let targets = [
        (&args.report_junit, ReportFormat::JUnit),
        (&args.report_json, ReportFormat::Json),
        (&args.report_tap, ReportFormat::Tap),
    ];
    for (path, format) in targets {
        if let Some(path) = path {
            write_report(&report, path, format)?;
        }
    }

    save_variables(&args.variables, &vars, &persistence)?;

    Ok(ExitStatus::from_outcome(report.all_passed()))
}

fn write_report(
    report: &RunReport,
    path: &Path,
    format: ReportFormat,
) -> Result<(), ProbestackError> {
    generate_report(report, &ReportConfig::new(path, format))?;
    info!(path = %path.display(), ?format, "report written");
    Ok(())
}

async fn send_command(args: SendArgs, config: &Config, style: Style) -> Result<ExitStatus, ProbestackError> {
    let request = load_request(&args.request)?;
    let (mut vars, persistence) = load_variables(&args.variables, config)?;
    let executor = build_executor(&args.execution, config)?;

    let prepared = executor.prepare(&request, &mut vars);
    let result = executor.send(&request, &prepared, &mut vars).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!(
            "{}",
            format_execution_result(&request.name, request.method, prepared.url(), &result, &style)
        );
    }

    if let Some(path) = &args.history {
        append_history(path, &HistoryEntry::from_result(prepared.url(), request.method, &result))?;
    }

    save_variables(&args.variables, &vars, &persistence)?;

    Ok(ExitStatus::from_outcome(result.fully_passed()))
}

/// Append one entry as a JSON line, creating the file and its parent if needed
fn append_history(path: &Path, entry: &HistoryEntry) -> Result<(), ProbestackError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", serde_json::to_string(entry)?)?;
    debug!(path = %path.display(), status = entry.status, "history entry appended");
    Ok(())
}

/// Render runner progress on stderr until the run completes
fn spawn_progress_bar(
    mut progress: watch::Receiver<RunProgress>,
    total: usize,
) -> tokio::task::JoinHandle<()> {
    let pb = ProgressBar::new(total as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(bar_style.progress_chars("#>-"));
    }

    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            pb.set_position(snapshot.completed() as u64);
            if let Some(name) = snapshot.current_request {
                pb.set_message(name);
            }
            if snapshot.status == RunStatus::Completed {
                break;
            }
        }
        pb.finish_and_clear();
    })
}

fn handle_error(error: ProbestackError) -> ExitStatus {
    eprintln!("Error: {}", error);
    ExitStatus::Error
}
