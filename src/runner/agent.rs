// src/runner/agent.rs

//! SSH agent lifetime.
//!
//! The agent holds decrypted runner keys in memory for the duration of one
//! run. `SshAgent::stop` consumes the handle, so the agent can be stopped at
//! most once; the dispatcher calls it on every exit path.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::errors::{HydraError, Result};
use crate::exec::{CommandRunner, CommandSpec, run_checked};

pub const AUTH_SOCK_VAR: &str = "SSH_AUTH_SOCK";
pub const AGENT_PID_VAR: &str = "SSH_AGENT_PID";

const PLACEHOLDER_SOCK: &str = "/tmp/hydra-ssh-agent.sock";
const PLACEHOLDER_PID: &str = "0";

static AGENT_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(SSH_AUTH_SOCK|SSH_AGENT_PID)=([^;\s]+)").expect("agent output pattern is valid")
});

#[derive(Debug)]
pub struct SshAgent {
    env: BTreeMap<String, String>,
}

impl SshAgent {
    /// Start `ssh-agent -s` and capture the variables it prints.
    ///
    /// If the output cannot be parsed the agent is still running; it is
    /// killed by whatever pid was printed before the error is returned.
    pub async fn start(runner: &mut dyn CommandRunner) -> Result<Self> {
        let output = run_checked(runner, &CommandSpec::new("ssh-agent").arg("-s")).await?;
        let agent = if runner.is_dry_run() {
            Self::placeholder()
        } else {
            match Self::parse(&output.stdout) {
                Ok(agent) => agent,
                Err(err) => {
                    Self::stop_partial(runner, &output.stdout).await;
                    return Err(err);
                }
            }
        };
        info!(pid = %agent.pid(), "ssh agent started");
        Ok(agent)
    }

    /// Parse `ssh-agent -s` output.
    pub fn parse(output: &str) -> Result<Self> {
        let env = capture_vars(output);
        if !env.contains_key(AUTH_SOCK_VAR) || !env.contains_key(AGENT_PID_VAR) {
            return Err(HydraError::Other(anyhow::anyhow!(
                "unexpected ssh-agent output: {}",
                output.trim()
            )));
        }
        Ok(Self { env })
    }

    /// Agent handle used in dry-run output.
    pub fn placeholder() -> Self {
        let env = BTreeMap::from([
            (AUTH_SOCK_VAR.to_string(), PLACEHOLDER_SOCK.to_string()),
            (AGENT_PID_VAR.to_string(), PLACEHOLDER_PID.to_string()),
        ]);
        Self { env }
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn pid(&self) -> &str {
        self.env.get(AGENT_PID_VAR).map(String::as_str).unwrap_or("?")
    }

    /// Attach the agent variables to a command.
    pub fn attach(&self, spec: CommandSpec) -> CommandSpec {
        spec.envs(self.env.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Load a private key. A key that cannot be loaded is a credential error.
    pub async fn add_key(&self, runner: &mut dyn CommandRunner, key: &Path) -> Result<()> {
        let spec = self.attach(CommandSpec::new("ssh-add").arg(key.display().to_string()));
        let output = runner.run(&spec).await?;
        if !output.is_success() {
            return Err(HydraError::CredentialError(format!(
                "failed to load SSH key {} into the agent (exit code {})",
                key.display(),
                output.code
            )));
        }
        debug!(key = %key.display(), "ssh key loaded");
        Ok(())
    }

    async fn stop_partial(runner: &mut dyn CommandRunner, output: &str) {
        let env = capture_vars(output);
        if env.contains_key(AGENT_PID_VAR) {
            Self { env }.stop(runner).await;
        } else {
            warn!("ssh-agent printed no pid; it cannot be stopped");
        }
    }

    /// Kill the agent. Failures are logged, never returned: this runs while
    /// another error may already be propagating.
    pub async fn stop(self, runner: &mut dyn CommandRunner) {
        let spec = self.attach(CommandSpec::new("ssh-agent").arg("-k"));
        match runner.run(&spec).await {
            Ok(out) if out.is_success() => info!(pid = %self.pid(), "ssh agent stopped"),
            Ok(out) => warn!(pid = %self.pid(), exit_code = out.code, "ssh-agent -k failed"),
            Err(e) => warn!(pid = %self.pid(), error = %e, "could not run ssh-agent -k"),
        }
    }
}

fn capture_vars(output: &str) -> BTreeMap<String, String> {
    AGENT_VAR
        .captures_iter(output)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}
