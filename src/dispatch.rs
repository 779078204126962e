// src/dispatch.rs

//! The runner dispatcher.
//!
//! One dispatch is: validate flags → detect tooling → resolve the target →
//! (remote only) start the SSH agent and prepare the runner → compose the
//! container invocation → run it and report its exit status.

use std::net::Ipv4Addr;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::container::{
    ContainerInvocation, ContainerTool, InvocationParts, PreparationScript, compose_command,
    discover_mock_hosts, ensure_image, image_ref, query_identity, terminal_fragment, user_command,
};
use crate::context::RunnerContext;
use crate::errors::Result;
use crate::exec::CommandRunner;
use crate::lock::LockStore;
use crate::runner::{
    ExecutionSite, RemoteHost, RunnerTarget, SshAgent, TargetRequest, prepare_remote,
    resolve_target,
};
use crate::shutdown::ShutdownSignals;

/// What the caller asked for, independent of how it was parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchRequest {
    pub create_new_runner: bool,
    pub runner_ip: Option<String>,
    pub aws_mock: bool,
    pub help: bool,
    pub tool_args: Vec<String>,
    pub command: Vec<String>,
}

impl From<&CliArgs> for DispatchRequest {
    fn from(args: &CliArgs) -> Self {
        Self {
            create_new_runner: args.execute_on_new_runner,
            runner_ip: args.execute_on_runner.clone(),
            aws_mock: args.aws_mock,
            help: args.wants_help(),
            tool_args: args.tool_args.clone(),
            command: args.command.clone(),
        }
    }
}

pub struct Dispatcher {
    ctx: RunnerContext,
    runner: Box<dyn CommandRunner>,
    lock: Box<dyn LockStore>,
}

impl Dispatcher {
    pub fn new(
        ctx: RunnerContext,
        runner: Box<dyn CommandRunner>,
        lock: Box<dyn LockStore>,
    ) -> Self {
        Self { ctx, runner, lock }
    }

    /// Run one dispatch and return the container's exit status.
    pub async fn dispatch(&mut self, request: &DispatchRequest) -> Result<i32> {
        let target_request =
            TargetRequest::from_flags(request.create_new_runner, request.runner_ip.as_deref())?;
        let tool = ContainerTool::detect(&self.ctx)?;
        let image = image_ref(&self.ctx)?;

        let target = resolve_target(
            &target_request,
            &self.ctx,
            self.lock.as_ref(),
            self.runner.as_mut(),
        )
        .await?;

        info!(
            ?target,
            tool = %tool.program,
            image = %image,
            test_id = %self.ctx.test_id,
            dry_run = self.ctx.dry_run,
            "dispatching"
        );

        match target {
            RunnerTarget::Local => {
                let site = ExecutionSite::local(&self.ctx);
                self.run_container(&site, &tool, &image, request).await
            }
            RunnerTarget::Remote(ip) => self.dispatch_remote(ip, &tool, &image, request).await,
        }
    }

    /// Remote dispatch inside the SSH agent's lifetime.
    ///
    /// The agent is stopped exactly once, whether the work succeeds, fails or
    /// is cut short by SIGINT or SIGTERM. Signal handlers go in before the
    /// agent starts; a signal already pending wins over the work.
    async fn dispatch_remote(
        &mut self,
        ip: Ipv4Addr,
        tool: &ContainerTool,
        image: &str,
        request: &DispatchRequest,
    ) -> Result<i32> {
        let mut signals = ShutdownSignals::install()?;
        let agent = SshAgent::start(self.runner.as_mut()).await?;
        let host = RemoteHost::new(ip, self.ctx.config.runner.user.clone());

        let outcome = tokio::select! {
            biased;
            err = signals.recv() => {
                warn!(runner_ip = %ip, reason = %err, "shutting down");
                Err(err)
            }
            res = self.run_remote(&host, &agent, tool, image, request) => res,
        };

        agent.stop(self.runner.as_mut()).await;
        outcome
    }

    async fn run_remote(
        &mut self,
        host: &RemoteHost,
        agent: &SshAgent,
        tool: &ContainerTool,
        image: &str,
        request: &DispatchRequest,
    ) -> Result<i32> {
        let site = prepare_remote(&self.ctx, host, agent, self.runner.as_mut()).await?;
        self.run_container(&site, tool, image, request).await
    }

    async fn run_container(
        &mut self,
        site: &ExecutionSite,
        tool: &ContainerTool,
        image: &str,
        request: &DispatchRequest,
    ) -> Result<i32> {
        let runner = self.runner.as_mut();
        ensure_image(site, tool, image, runner).await?;

        let mock = if request.aws_mock {
            Some(discover_mock_hosts(&self.ctx, site, tool, runner).await?)
        } else {
            None
        };
        let identity = query_identity(&self.ctx, site, runner).await?;

        let script = PreparationScript::build(&self.ctx, request.help, request.aws_mock);
        let line = compose_command(
            &script,
            terminal_fragment(&self.ctx),
            &user_command(&self.ctx, &request.tool_args, &request.command),
        );

        let started_at = if self.ctx.dry_run {
            0
        } else {
            chrono::Utc::now().timestamp()
        };
        let invocation = ContainerInvocation::compose(
            &self.ctx,
            site,
            InvocationParts {
                image_ref: image,
                identity: &identity,
                mock: mock.as_ref(),
                entrypoint_command: line,
                started_at,
            },
        );

        let spec = invocation.to_command(site, tool);
        info!(container = %invocation.name, remote = site.is_remote(), "starting test container");
        let output = runner.run(&spec).await?;
        info!(exit_code = output.code, "test container exited");
        Ok(output.code)
    }
}
