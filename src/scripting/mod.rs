//! Script sandbox for pre-request and test scripts
//!
//! Scripts are JavaScript, executed on an embedded QuickJS engine. A script
//! receives exactly two values:
//!
//! - `pm`: `environment`/`variables` accessors (`get`, `set`, `unset`,
//!   `toObject`), a read-only `request` view, a `response` view (test
//!   scripts only) and the `test(name, fn)` assertion primitive
//! - `console`: `log`/`info`/`warn`/`error`, forwarded to tracing
//!
//! Failures never escape [`ScriptSandbox::run`]; they are reported in the
//! returned [`ScriptOutcome`].

pub mod context;
mod pm;
pub mod runtime;

pub use context::{ResponseView, ScriptContext, ScriptOutcome};
pub use runtime::{ScriptSandbox, DEFAULT_SCRIPT_BUDGET};
