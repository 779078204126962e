// src/lib.rs

pub mod cli;
pub mod config;
pub mod container;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod exec;
pub mod lock;
pub mod logging;
pub mod runner;
pub mod shutdown;

use anyhow::Context;
use tracing::debug;

use crate::cli::CliArgs;
use crate::context::RunnerContext;
use crate::dispatch::{DispatchRequest, Dispatcher};
use crate::errors::Result;
use crate::exec::{CommandRunner, DryRunCommandRunner, RealCommandRunner};
use crate::lock::FileLockStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the process context snapshot
/// - the command runner (real or dry-run)
/// - the runner marker file
/// - the dispatcher
///
/// Returns the exit status hydra should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let config = config::resolve(args.hydra_config.as_deref(), &cwd)?;

    let ctx = RunnerContext::from_process(config, args.dry_run_hydra)?;
    debug!(sct_dir = %ctx.sct_dir.display(), user = %ctx.user, "context captured");

    let runner: Box<dyn CommandRunner> = if args.dry_run_hydra {
        Box::new(DryRunCommandRunner::new())
    } else {
        Box::new(RealCommandRunner::new())
    };
    let lock = Box::new(FileLockStore::new(ctx.runner_ip_file()));

    let request = DispatchRequest::from(&args);
    let mut dispatcher = Dispatcher::new(ctx, runner, lock);
    dispatcher.dispatch(&request).await
}
