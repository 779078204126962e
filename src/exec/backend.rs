// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The dispatcher never spawns processes itself; it hands `CommandSpec`s to a
//! `CommandRunner`.
//!
//! - `RealCommandRunner` runs them with `tokio::process::Command`.
//! - `DryRunCommandRunner` (see [`super::dry_run`]) prints them.
//! - Tests provide a recording fake that scripts outputs per command.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{HydraError, Result};

use super::spec::{CommandOutput, CommandSpec, OutputMode};

/// Trait abstracting how external commands are executed.
pub trait CommandRunner: Send {
    /// Execute `spec` and report its exit status and captured output.
    ///
    /// A non-zero exit status is *not* an error at this level; callers decide
    /// (see [`run_checked`]). Errors are reserved for failing to run at all.
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;

    /// True when commands are printed rather than executed.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Run `spec` and turn a non-zero exit status into `HydraError::CommandFailed`.
pub async fn run_checked(
    runner: &mut dyn CommandRunner,
    spec: &CommandSpec,
) -> Result<CommandOutput> {
    let output = runner.run(spec).await?;
    if !output.is_success() {
        return Err(HydraError::CommandFailed {
            command: spec.render(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Real runner used in production.
#[derive(Debug, Default, Clone)]
pub struct RealCommandRunner;

impl RealCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for RealCommandRunner {
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            debug!(cmd = %spec, "running command");

            let mut cmd = Command::new(spec.get_program());
            cmd.args(spec.get_args())
                .envs(spec.get_envs())
                .kill_on_drop(true);

            match spec.output_mode() {
                OutputMode::Captured => {
                    let output = cmd
                        .stdin(Stdio::null())
                        .output()
                        .await
                        .with_context(|| format!("spawning `{}`", spec.get_program()))?;
                    let code = exit_code(&output.status);
                    debug!(program = %spec.get_program(), exit_code = code, "command finished");
                    Ok(CommandOutput {
                        code,
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    })
                }
                OutputMode::Interactive => {
                    let status = cmd
                        .stdin(Stdio::inherit())
                        .stdout(Stdio::inherit())
                        .stderr(Stdio::inherit())
                        .status()
                        .await
                        .with_context(|| format!("spawning `{}`", spec.get_program()))?;
                    Ok(CommandOutput::from_code(exit_code(&status)))
                }
            }
        })
    }
}

/// Exit code of a finished child; signals map to `128 + signo` like a shell.
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    -1
}
