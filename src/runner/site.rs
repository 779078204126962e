// src/runner/site.rs

//! Where commands and the container run, and how paths look there.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::container::ContainerTool;
use crate::context::RunnerContext;
use crate::exec::{CommandSpec, shell_join};

const SSH_OPTS: [&str; 2] = ["-o", "StrictHostKeyChecking=no"];

/// A remote runner reachable over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHost {
    pub ip: Ipv4Addr,
    pub user: String,
}

impl RemoteHost {
    pub fn new(ip: Ipv4Addr, user: impl Into<String>) -> Self {
        Self {
            ip,
            user: user.into(),
        }
    }

    /// `user@ip`.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.ip)
    }

    pub fn home(&self) -> String {
        format!("/home/{}", self.user)
    }

    /// `ssh` invocation running `remote_command` on the host.
    pub fn ssh(&self, remote_command: impl Into<String>) -> CommandSpec {
        CommandSpec::new("ssh")
            .args(SSH_OPTS)
            .arg(self.destination())
            .arg(remote_command)
    }

    /// Mirror `src` to `dest` on the host, deleting extraneous remote files.
    pub fn rsync(&self, src: &str, dest: &str) -> CommandSpec {
        CommandSpec::new("rsync")
            .arg("-ar")
            .arg("-e")
            .arg(format!("ssh {}", SSH_OPTS.join(" ")))
            .arg("--delete")
            .arg(src)
            .arg(format!("{}:{}", self.destination(), dest))
    }
}

/// The execution site after path rewriting.
#[derive(Debug, Clone)]
pub struct ExecutionSite {
    /// Working tree as seen by the container host.
    pub sct_dir: String,
    /// Home directory as seen by the container host.
    pub home: String,
    /// Container hostname.
    pub hostname: String,
    pub remote: Option<RemoteHost>,
    /// Extra environment for every command aimed at this site (the SSH agent
    /// variables on a remote site).
    pub command_env: BTreeMap<String, String>,
}

impl ExecutionSite {
    pub fn local(ctx: &RunnerContext) -> Self {
        Self {
            sct_dir: ctx.sct_dir.display().to_string(),
            home: ctx.home.display().to_string(),
            hostname: ctx.config.container.hostname.clone(),
            remote: None,
            command_env: BTreeMap::new(),
        }
    }

    /// Remote site: the working tree lives under the runner user's home.
    pub fn remote(
        ctx: &RunnerContext,
        host: RemoteHost,
        command_env: BTreeMap<String, String>,
    ) -> Self {
        let dir_name = ctx
            .sct_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scylla-cluster-tests".to_string());
        let home = host.home();
        Self {
            sct_dir: format!("{home}/{dir_name}"),
            home,
            hostname: ctx.config.container.remote_hostname.clone(),
            remote: Some(host),
            command_env,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn runner_ip(&self) -> Option<Ipv4Addr> {
        self.remote.as_ref().map(|h| h.ip)
    }

    /// The container tool, pointed at this site's daemon.
    pub fn runtime_command(&self, tool: &ContainerTool) -> CommandSpec {
        let mut spec = CommandSpec::new(tool.program.as_str());
        if let Some(host) = &self.remote {
            spec = spec.args(tool.remote_host_args(host));
        }
        self.with_env(spec)
    }

    /// A shell snippet executed on the site's host: `sh -c` locally, `ssh`
    /// remotely.
    pub fn host_shell(&self, script: &str) -> CommandSpec {
        let spec = match &self.remote {
            Some(host) => host.ssh(script),
            None => CommandSpec::new("sh").arg("-c").arg(script),
        };
        self.with_env(spec)
    }

    /// A single program run on the site's host.
    pub fn host_command(&self, program: &str, args: &[&str]) -> CommandSpec {
        let spec = match &self.remote {
            Some(host) => {
                let mut tokens = vec![program];
                tokens.extend_from_slice(args);
                host.ssh(shell_join(&tokens))
            }
            None => CommandSpec::new(program).args(args.iter().copied()),
        };
        self.with_env(spec)
    }

    fn with_env(&self, spec: CommandSpec) -> CommandSpec {
        spec.envs(self.command_env.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}
