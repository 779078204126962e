// src/runner/mod.rs

//! Execution target handling.
//!
//! - [`target`] validates the runner flags and resolves a `RunnerTarget`,
//!   provisioning a new runner when asked to.
//! - [`provision`] builds the provisioning command.
//! - [`agent`] owns the SSH agent lifetime.
//! - [`remote`] prepares a runner (keys, tree sync, credentials).
//! - [`site`] describes where the container runs and how paths look there.

pub mod agent;
pub mod provision;
pub mod remote;
pub mod site;
pub mod target;

pub use agent::SshAgent;
pub use provision::ProvisionRequest;
pub use remote::prepare_remote;
pub use site::{ExecutionSite, RemoteHost};
pub use target::{
    PLACEHOLDER_RUNNER_IP, RunnerTarget, TargetRequest, parse_runner_ip, resolve_target,
};
