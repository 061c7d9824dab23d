//! The `pm` object and `console` exposed to user scripts
//!
//! These two values are the only capabilities a script receives. Every
//! mutation lands in the shared [`SandboxState`] so it can be folded back
//! into the caller after the run.

use indexmap::IndexMap;
use rquickjs::convert::Coerced;
use rquickjs::function::{Opt, Rest};
use rquickjs::{Array, Ctx, Exception, Function, IntoJs, Object, Value};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::context::{ResponseView, ScriptContext};
use crate::models::TestResult;

/// Which variable map a `pm.*` accessor writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptScope {
    Environment,
    Variables,
}

/// Mutations for one scope, layered over the stored seed
#[derive(Debug, Default)]
pub(crate) struct ScopeState {
    seed: IndexMap<String, String>,
    pub(crate) set: IndexMap<String, String>,
    pub(crate) unset: Vec<String>,
}

impl ScopeState {
    fn seeded(seed: IndexMap<String, String>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        if self.unset.iter().any(|k| k == key) {
            return None;
        }
        self.set
            .get(key)
            .or_else(|| self.seed.get(key))
            .map(String::as_str)
    }

    fn set(&mut self, key: String, value: String) {
        self.unset.retain(|k| k != &key);
        self.set.insert(key, value);
    }

    fn unset(&mut self, key: String) {
        self.set.shift_remove(&key);
        if !self.unset.contains(&key) {
            self.unset.push(key);
        }
    }

    fn snapshot(&self) -> IndexMap<String, String> {
        let mut merged: IndexMap<String, String> = self
            .seed
            .iter()
            .filter(|(k, _)| !self.unset.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        merged.extend(self.set.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Side effects accumulated during one script run
#[derive(Debug, Default)]
pub(crate) struct SandboxState {
    pub(crate) environment: ScopeState,
    pub(crate) variables: ScopeState,
    pub(crate) test_results: Vec<TestResult>,
}

impl SandboxState {
    pub(crate) fn seeded(seed: &ScriptContext) -> Self {
        Self {
            environment: ScopeState::seeded(seed.environment.clone()),
            variables: ScopeState::seeded(seed.variables.clone()),
            test_results: Vec::new(),
        }
    }

    fn scope_mut(&mut self, scope: ScriptScope) -> &mut ScopeState {
        match scope {
            ScriptScope::Environment => &mut self.environment,
            ScriptScope::Variables => &mut self.variables,
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<SandboxState>>;

fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut SandboxState) -> R) -> R {
    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

/// Build the `pm` object for one run
pub(crate) fn build_pm<'js>(
    ctx: &Ctx<'js>,
    seed: &ScriptContext,
    state: &SharedState,
    timed_out: &Arc<AtomicBool>,
) -> rquickjs::Result<Object<'js>> {
    let pm = Object::new(ctx.clone())?;

    pm.set("environment", build_scope(ctx, state, ScriptScope::Environment)?)?;
    pm.set("variables", build_scope(ctx, state, ScriptScope::Variables)?)?;
    pm.set("request", build_request(ctx, seed)?)?;
    if let Some(response) = &seed.response {
        pm.set("response", build_response(ctx, response)?)?;
    }
    pm.set("test", build_test(ctx, state, timed_out)?)?;

    Ok(pm)
}

fn build_scope<'js>(
    ctx: &Ctx<'js>,
    state: &SharedState,
    scope: ScriptScope,
) -> rquickjs::Result<Object<'js>> {
    let obj = Object::new(ctx.clone())?;

    let st = state.clone();
    obj.set(
        "set",
        Function::new(
            ctx.clone(),
            move |key: Coerced<String>, value: Coerced<String>| {
                with_state(&st, |s| s.scope_mut(scope).set(key.0, value.0));
            },
        )?,
    )?;

    let st = state.clone();
    obj.set(
        "get",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, key: Coerced<String>| -> rquickjs::Result<Value<'js>> {
                let found = with_state(&st, |s| s.scope_mut(scope).get(&key.0).map(str::to_string));
                match found {
                    Some(value) => value.into_js(&ctx),
                    None => Ok(Value::new_null(ctx)),
                }
            },
        )?,
    )?;

    let st = state.clone();
    obj.set(
        "unset",
        Function::new(ctx.clone(), move |key: Coerced<String>| {
            with_state(&st, |s| s.scope_mut(scope).unset(key.0));
        })?,
    )?;

    let st = state.clone();
    obj.set(
        "toObject",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>| -> rquickjs::Result<Object<'js>> {
                let snapshot = with_state(&st, |s| s.scope_mut(scope).snapshot());
                map_to_object(&ctx, &snapshot)
            },
        )?,
    )?;

    Ok(obj)
}

fn build_request<'js>(ctx: &Ctx<'js>, seed: &ScriptContext) -> rquickjs::Result<Object<'js>> {
    let request = Object::new(ctx.clone())?;
    request.set("url", seed.url.as_str())?;
    request.set("method", seed.method.as_str())?;
    request.set("headers", map_to_object(ctx, &seed.headers)?)?;
    request.set("params", map_to_object(ctx, &seed.params)?)?;
    match &seed.body {
        Some(body) => request.set("body", body.as_str())?,
        None => request.set("body", Value::new_null(ctx.clone()))?,
    }
    Ok(request)
}

fn build_response<'js>(ctx: &Ctx<'js>, response: &ResponseView) -> rquickjs::Result<Object<'js>> {
    let obj = Object::new(ctx.clone())?;
    obj.set("code", response.status as i32)?;
    obj.set("status", response.status_text.as_str())?;
    obj.set("headers", map_to_object(ctx, &response.headers)?)?;

    let parsed = response.json();
    obj.set(
        "json",
        Function::new(ctx.clone(), move |ctx: Ctx<'js>| json_to_js_value(&ctx, &parsed))?,
    )?;

    let text = response.text();
    obj.set(
        "text",
        Function::new(ctx.clone(), move || text.clone())?,
    )?;

    // pm.response.to.have.status(code)
    let actual = response.status;
    let have = Object::new(ctx.clone())?;
    have.set(
        "status",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, expected: Coerced<i32>| -> rquickjs::Result<bool> {
                if expected.0 == i32::from(actual) {
                    Ok(true)
                } else {
                    Err(Exception::throw_message(
                        &ctx,
                        &format!(
                            "expected response to have status code {} but got {}",
                            expected.0, actual
                        ),
                    ))
                }
            },
        )?,
    )?;
    let to = Object::new(ctx.clone())?;
    to.set("have", have)?;
    obj.set("to", to)?;

    Ok(obj)
}

fn build_test<'js>(
    ctx: &Ctx<'js>,
    state: &SharedState,
    timed_out: &Arc<AtomicBool>,
) -> rquickjs::Result<Function<'js>> {
    let st = state.clone();
    let timed_out = timed_out.clone();
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, name: Coerced<String>, f: Opt<Value<'js>>| -> rquickjs::Result<()> {
            let Some(f) = f.0.as_ref().and_then(Value::as_function) else {
                let message = format!("{} is not a function", name.0);
                with_state(&st, |s| s.test_results.push(TestResult::failed(name.0, message)));
                return Ok(());
            };
            match f.call::<_, Value>(()) {
                Ok(_) => with_state(&st, |s| s.test_results.push(TestResult::passed(name.0))),
                Err(err) => {
                    // The interrupt must unwind the whole script
                    if timed_out.load(Ordering::SeqCst) {
                        return Err(err);
                    }
                    let message = super::runtime::describe_error(&ctx, err);
                    with_state(&st, |s| s.test_results.push(TestResult::failed(name.0, message)));
                }
            }
            Ok(())
        },
    )
}

/// `console.log/info/warn/error`, forwarded to tracing
pub(crate) fn build_console<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let console = Object::new(ctx.clone())?;

    console.set(
        "log",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::info!(target: "probestack::script", "{}", join_args(args));
        })?,
    )?;
    console.set(
        "info",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::info!(target: "probestack::script", "{}", join_args(args));
        })?,
    )?;
    console.set(
        "warn",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::warn!(target: "probestack::script", "{}", join_args(args));
        })?,
    )?;
    console.set(
        "error",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::error!(target: "probestack::script", "{}", join_args(args));
        })?,
    )?;

    Ok(console)
}

fn join_args(args: Rest<Coerced<String>>) -> String {
    args.0
        .into_iter()
        .map(|a| a.0)
        .collect::<Vec<_>>()
        .join(" ")
}

fn map_to_object<'js>(
    ctx: &Ctx<'js>,
    map: &IndexMap<String, String>,
) -> rquickjs::Result<Object<'js>> {
    let obj = Object::new(ctx.clone())?;
    for (key, value) in map {
        obj.set(key.as_str(), value.as_str())?;
    }
    Ok(obj)
}

/// Convert a serde_json value into a QuickJS value
pub(crate) fn json_to_js_value<'js>(ctx: &Ctx<'js>, json: &JsonValue) -> rquickjs::Result<Value<'js>> {
    match json {
        JsonValue::Null => Ok(Value::new_null(ctx.clone())),
        JsonValue::Bool(b) => Ok(Value::new_bool(ctx.clone(), *b)),
        JsonValue::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => Ok(Value::new_int(ctx.clone(), i)),
            None => Ok(Value::new_float(ctx.clone(), n.as_f64().unwrap_or(0.0))),
        },
        JsonValue::String(s) => s.as_str().into_js(ctx),
        JsonValue::Array(items) => {
            let arr = Array::new(ctx.clone())?;
            for (i, item) in items.iter().enumerate() {
                arr.set(i, json_to_js_value(ctx, item)?)?;
            }
            Ok(arr.into_value())
        }
        JsonValue::Object(map) => {
            let obj = Object::new(ctx.clone())?;
            for (key, value) in map {
                obj.set(key.as_str(), json_to_js_value(ctx, value)?)?;
            }
            Ok(obj.into_value())
        }
    }
}
