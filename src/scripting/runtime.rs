//! Sandboxed JavaScript execution using QuickJS via rquickjs
//!
//! Each run gets a fresh runtime and context with memory, stack and
//! wall-clock limits. The user script becomes the body of
//! `function (pm, console)` and sees no other host capability.

use rquickjs::convert::Coerced;
use rquickjs::{Context, Ctx, FromJs, Function, Runtime, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use super::context::{ScriptContext, ScriptOutcome};
use super::pm::{build_console, build_pm, SandboxState, SharedState};

/// Default per-script wall-clock budget
pub const DEFAULT_SCRIPT_BUDGET: Duration = Duration::from_millis(5000);

const MEMORY_LIMIT: usize = 64 * 1024 * 1024;
const MAX_STACK_SIZE: usize = 1024 * 1024;

/// Runs user scripts against a `pm` context
#[derive(Debug, Clone)]
pub struct ScriptSandbox {
    budget: Duration,
}

impl ScriptSandbox {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run a script. Never fails: every error is reported in the outcome.
    pub fn run(&self, script: &str, seed: &ScriptContext) -> ScriptOutcome {
        if script.trim().is_empty() {
            return ScriptOutcome::empty();
        }

        let state: SharedState = Arc::new(Mutex::new(SandboxState::seeded(seed)));
        let error = self.execute(script, seed, &state).err();
        if let Some(ref message) = error {
            debug!(error = %message, "script execution failed");
        }

        let state = state.lock().unwrap_or_else(|e| e.into_inner());
        ScriptOutcome {
            success: error.is_none(),
            error,
            test_results: state.test_results.clone(),
            environment: state.environment.set.clone(),
            variables: state.variables.set.clone(),
            unset_environment: state.environment.unset.clone(),
            unset_variables: state.variables.unset.clone(),
        }
    }

    fn execute(&self, script: &str, seed: &ScriptContext, state: &SharedState) -> Result<(), String> {
        let runtime = Runtime::new().map_err(|e| format!("Failed to create JS runtime: {}", e))?;
        runtime.set_memory_limit(MEMORY_LIMIT);
        runtime.set_max_stack_size(MAX_STACK_SIZE);

        let timed_out = Arc::new(AtomicBool::new(false));
        let flag = timed_out.clone();
        let budget = self.budget;
        let start = Instant::now();
        runtime.set_interrupt_handler(Some(Box::new(move || {
            if start.elapsed() > budget {
                flag.store(true, Ordering::SeqCst);
                true
            } else {
                false
            }
        })));

        let context =
            Context::full(&runtime).map_err(|e| format!("Failed to create JS context: {}", e))?;

        let result = context.with(|ctx| {
            let pm = build_pm(&ctx, seed, state, &timed_out)
                .map_err(|e| format!("Failed to build script context: {}", e))?;
            let console = build_console(&ctx)
                .map_err(|e| format!("Failed to build console: {}", e))?;

            let wrapped = format!("(function (pm, console) {{\n{}\n}})", script);
            let func: Function = ctx
                .eval(wrapped)
                .map_err(|e| describe_error(&ctx, e))?;
            func.call::<_, Value>((pm, console))
                .map(|_| ())
                .map_err(|e| describe_error(&ctx, e))
        });

        if timed_out.load(Ordering::SeqCst) {
            return Err(format!(
                "script exceeded execution budget of {} ms",
                budget.as_millis()
            ));
        }
        result
    }
}

impl Default for ScriptSandbox {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_BUDGET)
    }
}

/// Turn a QuickJS error into the message a user would see.
///
/// Pending exceptions are taken off the context.
pub(crate) fn describe_error(ctx: &Ctx<'_>, err: rquickjs::Error) -> String {
    if !matches!(err, rquickjs::Error::Exception) {
        return err.to_string();
    }

    let value = ctx.catch();
    if let Some(exception) = value.as_exception() {
        return exception
            .message()
            .unwrap_or_else(|| "Uncaught exception".to_string());
    }
    Coerced::<String>::from_js(ctx, value)
        .map(|s| s.0)
        .unwrap_or_else(|_| "Uncaught exception".to_string())
}
