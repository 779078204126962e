// src/runner/remote.rs

//! Remote runner preparation: keys, source tree and credentials.

use tracing::{debug, info, warn};

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::exec::{CommandRunner, CommandSpec, run_checked};

use super::agent::SshAgent;
use super::site::{ExecutionSite, RemoteHost};

/// Prepare `host` for a run and return the rewritten execution site.
///
/// Steps, in order:
/// 1. load every configured key into `agent`
/// 2. forget any cached host key for the runner's address
/// 3. mirror the working tree to the runner
/// 4. mirror AWS credentials unless they come from the environment
/// 5. mirror the GCE credential file for gce/gke backends
pub async fn prepare_remote(
    ctx: &RunnerContext,
    host: &RemoteHost,
    agent: &SshAgent,
    runner: &mut dyn CommandRunner,
) -> Result<ExecutionSite> {
    for key in &ctx.config.ssh.keys {
        agent.add_key(runner, &ctx.home_path(key)).await?;
    }

    let forget = CommandSpec::new("ssh-keygen")
        .arg("-R")
        .arg(host.ip.to_string());
    let out = runner.run(&forget).await?;
    if !out.is_success() {
        warn!(runner_ip = %host.ip, exit_code = out.code, "could not remove cached host key");
    }

    info!(runner_ip = %host.ip, src = %ctx.sct_dir.display(), "syncing working tree to runner");
    let sync_tree = host.rsync(
        &ctx.sct_dir.display().to_string(),
        &format!("{}/", host.home()),
    );
    run_checked(runner, &agent.attach(sync_tree)).await?;

    sync_aws_credentials(ctx, host, agent, runner).await?;
    sync_gce_credentials(ctx, host, agent, runner).await?;

    Ok(ExecutionSite::remote(
        ctx,
        host.clone(),
        agent.env().clone(),
    ))
}

async fn sync_aws_credentials(
    ctx: &RunnerContext,
    host: &RemoteHost,
    agent: &SshAgent,
    runner: &mut dyn CommandRunner,
) -> Result<()> {
    if ctx.has_aws_env_credentials() {
        debug!("AWS credentials found in environment; not syncing credentials directory");
        return Ok(());
    }

    let creds = &ctx.config.credentials;
    let local_dir = ctx.home_path(&creds.aws_dir);
    let local_file = local_dir.join(&creds.aws_file);
    if !local_file.is_file() {
        return Err(HydraError::CredentialError(format!(
            "no AWS credentials in the environment and {} does not exist",
            local_file.display()
        )));
    }

    let dir_name = local_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".aws".to_string());
    let spec = host.rsync(
        &format!("{}/", local_dir.display()),
        &format!("{}/{}/", host.home(), dir_name),
    );
    info!(runner_ip = %host.ip, "syncing AWS credentials to runner");
    run_checked(runner, &agent.attach(spec)).await?;
    Ok(())
}

async fn sync_gce_credentials(
    ctx: &RunnerContext,
    host: &RemoteHost,
    agent: &SshAgent,
    runner: &mut dyn CommandRunner,
) -> Result<()> {
    if !ctx.uses_gce_backend() {
        return Ok(());
    }

    let local_file = ctx.home_path(&ctx.config.credentials.gce_file);
    if !local_file.is_file() {
        warn!(
            path = %local_file.display(),
            "GCE backend selected but no GCE credential file found; continuing without it"
        );
        return Ok(());
    }

    let spec = host.rsync(
        &local_file.display().to_string(),
        &format!("{}/", host.home()),
    );
    info!(runner_ip = %host.ip, "syncing GCE credentials to runner");
    run_checked(runner, &agent.attach(spec)).await?;
    Ok(())
}
