//! Terminal output

pub mod format;
pub mod terminal;

pub use format::{format_execution_result, format_run_report, format_run_report_json, format_size};
pub use terminal::Style;
