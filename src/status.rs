//! Exit status codes for the CLI
//!
//! - 0: Every request succeeded and every test passed
//! - 1: Usage, configuration or loading error
//! - 10: At least one request or test failed

use std::process::{ExitCode, Termination};

/// Exit status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Successful execution
    Success = 0,
    /// Any error that prevented the run
    Error = 1,
    /// A request failed or a test assertion did not hold
    TestsFailed = 10,
}

impl ExitStatus {
    /// Pick the status for a finished run
    pub fn from_outcome(all_passed: bool) -> Self {
        if all_passed {
            ExitStatus::Success
        } else {
            ExitStatus::TestsFailed
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}
