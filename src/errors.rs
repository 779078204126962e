// src/errors.rs

//! Crate-wide error type and exit-code mapping.
//!
//! Every variant is fatal: hydra makes a single attempt per run and leaves
//! retry policy to whatever invoked it (usually a CI pipeline).

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for generic fatal errors.
pub const EXIT_FATAL: i32 = 1;
/// Exit code for a malformed `--execute-on-runner` address.
pub const EXIT_INVALID_RUNNER_IP: i32 = 2;
/// Exit code when the run was interrupted by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;
/// Exit code when the run was stopped by SIGTERM.
pub const EXIT_TERMINATED: i32 = 143;

#[derive(Error, Debug)]
pub enum HydraError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(
        "There is a runner IP ({ip}) recorded in {}. Either delete that file or reuse the \
         runner with `--execute-on-runner {ip}`",
        path.display()
    )]
    LockConflictError { path: PathBuf, ip: String },

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Tooling error: {0}")]
    ToolingError(String),

    /// `stderr` is the child's trimmed error output, empty when none was
    /// captured.
    #[error("command `{command}` failed with exit code {code}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("interrupted")]
    Interrupted,

    #[error("terminated")]
    Terminated,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HydraError {
    /// Process exit code to report for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            HydraError::ValidationError(_) => EXIT_INVALID_RUNNER_IP,
            HydraError::Interrupted => EXIT_INTERRUPTED,
            HydraError::Terminated => EXIT_TERMINATED,
            _ => EXIT_FATAL,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HydraError>;
