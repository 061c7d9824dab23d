//! Common test utilities for probestack integration tests
//!
//! - Fixture files in temporary directories
//! - Binary invocation through assert_cmd with an isolated environment

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use probestack::http::HttpMethod;
use probestack::models::RequestDefinition;

/// Exit code for failed requests or tests
pub const EXIT_TESTS_FAILED: i32 = 10;

/// Write `content` to `name` inside `dir`
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("failed to write fixture");
    path
}

/// Temporary directory with a config file and a variables directory
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        write_fixture(dir.path(), "config.toml", "[defaults]\ntimeout_secs = 5\n");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn vars_dir(&self) -> PathBuf {
        self.dir.path().join("variables")
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        write_fixture(self.dir.path(), name, content)
    }

    /// Binary invocation with config and variable directory pinned to this workspace
    pub fn command(&self, subcommand: &str, file: &Path) -> Command {
        let mut cmd = probestack();
        cmd.arg(subcommand)
            .arg(file)
            .arg("--config")
            .arg(self.config_path())
            .arg("--vars-dir")
            .arg(self.vars_dir());
        cmd
    }
}

/// The probestack binary with colors and ambient logging disabled
pub fn probestack() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_probestack"));
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("PROBESTACK_ENVIRONMENT");
    cmd
}

/// GET request definition
pub fn get(name: &str, url: impl Into<String>) -> RequestDefinition {
    RequestDefinition::new(name, HttpMethod::Get, url)
}
