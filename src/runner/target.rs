// src/runner/target.rs

//! Execution target resolution.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::exec::{CommandRunner, run_checked};
use crate::lock::LockStore;

use super::provision::ProvisionRequest;

/// Stand-in runner address used in dry-run output.
pub const PLACEHOLDER_RUNNER_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{1,3}\.){3}[0-9]{1,3}$").expect("dotted-quad pattern is valid")
});

/// Where the container will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerTarget {
    Local,
    Remote(Ipv4Addr),
}

/// What the flags asked for, after validation but before any side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRequest {
    Local,
    NewRunner,
    Existing(Ipv4Addr),
}

impl TargetRequest {
    /// Validate the runner flags.
    ///
    /// Both flags together are a `ConfigError`; a malformed address is a
    /// `ValidationError`.
    pub fn from_flags(create_new_runner: bool, runner_ip: Option<&str>) -> Result<Self> {
        match (create_new_runner, runner_ip) {
            (true, Some(_)) => Err(HydraError::ConfigError(
                "--execute-on-new-runner and --execute-on-runner are mutually exclusive"
                    .to_string(),
            )),
            (true, None) => Ok(TargetRequest::NewRunner),
            (false, Some(ip)) => Ok(TargetRequest::Existing(parse_runner_ip(ip)?)),
            (false, None) => Ok(TargetRequest::Local),
        }
    }
}

/// Parse a runner address: dotted-quad shape with every octet in range.
pub fn parse_runner_ip(raw: &str) -> Result<Ipv4Addr> {
    let invalid = || {
        HydraError::ValidationError(format!(
            "invalid runner IP address {raw:?}: expected an IPv4 dotted-quad like 10.0.0.1"
        ))
    };
    if !DOTTED_QUAD.is_match(raw) {
        return Err(invalid());
    }
    raw.parse::<Ipv4Addr>().map_err(|_| invalid())
}

/// Turn a validated request into a concrete target.
///
/// For `NewRunner` this runs the external provisioning step, which records
/// the new runner's address in the marker file as a side effect.
pub async fn resolve_target(
    request: &TargetRequest,
    ctx: &RunnerContext,
    lock: &dyn LockStore,
    runner: &mut dyn CommandRunner,
) -> Result<RunnerTarget> {
    match request {
        TargetRequest::Local => Ok(RunnerTarget::Local),
        TargetRequest::Existing(ip) => {
            info!(runner_ip = %ip, "using existing runner");
            Ok(RunnerTarget::Remote(*ip))
        }
        TargetRequest::NewRunner => {
            if let Some(ip) = lock.read()? {
                return Err(HydraError::LockConflictError {
                    path: lock.location().to_path_buf(),
                    ip,
                });
            }

            let provision = ProvisionRequest::from_context(ctx)?;
            info!(
                cloud_provider = %provision.cloud_provider,
                region = %provision.region,
                test_id = %provision.test_id,
                "creating new runner instance"
            );
            let spec = provision.to_command(&ctx.config.runner.provision_command);
            run_checked(runner, &spec).await?;

            if runner.is_dry_run() {
                return Ok(RunnerTarget::Remote(PLACEHOLDER_RUNNER_IP));
            }

            let recorded = lock.read()?.ok_or_else(|| {
                warn!(path = %lock.location().display(), "provisioning left no runner marker");
                HydraError::Other(anyhow::anyhow!(
                    "runner provisioning finished but {} was not written",
                    lock.location().display()
                ))
            })?;
            let ip = parse_runner_ip(&recorded)?;
            info!(runner_ip = %ip, "new runner is ready");
            Ok(RunnerTarget::Remote(ip))
        }
    }
}
