// src/container/invocation.rs

//! The single `run` invocation of the test container.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::RunnerContext;
use crate::exec::CommandSpec;
use crate::runner::ExecutionSite;

use super::identity::UserIdentity;
use super::mock::MockHosts;
use super::tool::{ContainerTool, RuntimeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: String,
    pub container: String,
    pub mode: MountMode,
}

impl Mount {
    pub fn rw(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            mode: MountMode::ReadWrite,
        }
    }

    pub fn ro(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            host: path.clone(),
            container: path,
            mode: MountMode::ReadOnly,
        }
    }

    /// `-v` argument value.
    pub fn to_arg(&self) -> String {
        match self.mode {
            MountMode::ReadWrite => format!("{}:{}", self.host, self.container),
            MountMode::ReadOnly => format!("{}:{}:ro", self.host, self.container),
        }
    }
}

/// Inputs that are not derivable from the context and site.
#[derive(Debug, Clone)]
pub struct InvocationParts<'a> {
    pub image_ref: &'a str,
    pub identity: &'a UserIdentity,
    pub mock: Option<&'a MockHosts>,
    pub entrypoint_command: String,
    /// Unix timestamp used in the container name.
    pub started_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInvocation {
    pub image_ref: String,
    pub name: String,
    pub hostname: String,
    pub mounts: Vec<Mount>,
    /// Variables forwarded by name; the runtime reads their values.
    pub env_passthrough: BTreeSet<String>,
    /// Variables set to explicit values.
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub working_dir: String,
    pub user: String,
    pub group_ids: Vec<String>,
    pub extra_hosts: Vec<(String, String)>,
    pub tty: bool,
    pub entrypoint_command: String,
}

impl ContainerInvocation {
    pub fn compose(ctx: &RunnerContext, site: &ExecutionSite, parts: InvocationParts<'_>) -> Self {
        let mounts = vec![
            Mount::rw(&site.sct_dir, &site.sct_dir),
            Mount::rw("/tmp", "/tmp"),
            Mount::rw("/var/tmp", "/var/tmp"),
            Mount::rw(&site.home, &site.home),
            Mount::ro("/etc/passwd"),
            Mount::ro("/etc/group"),
            Mount::ro("/etc/sudoers"),
            Mount::ro("/etc/sudoers.d"),
            Mount::ro("/etc/shadow"),
            Mount::rw("/var/run", "/run"),
        ];

        let mut env_passthrough: BTreeSet<String> =
            ctx.forwarded_env_names().into_iter().collect();
        if ctx.var("GIT_USER_EMAIL").is_some() {
            env_passthrough.insert("GIT_USER_EMAIL".to_string());
        }

        let mut env = BTreeMap::from([("_SCT_BASE_DIR".to_string(), site.sct_dir.clone())]);
        if ctx.test_id_generated {
            env_passthrough.remove("SCT_TEST_ID");
            env.insert("SCT_TEST_ID".to_string(), ctx.test_id.clone());
        }

        let mut labels = BTreeMap::from([
            ("TestId".to_string(), ctx.test_id.clone()),
            ("RunByUser".to_string(), ctx.user.clone()),
            ("NodeType".to_string(), "sct-runner".to_string()),
        ]);
        if let Some(ip) = site.runner_ip() {
            env.insert("RUNNER_IP".to_string(), ip.to_string());
            labels.insert("RunnerIp".to_string(), ip.to_string());
        }

        Self {
            image_ref: parts.image_ref.to_string(),
            name: format!("{}_{}", ctx.test_id, parts.started_at),
            hostname: site.hostname.clone(),
            mounts,
            env_passthrough,
            env,
            labels,
            working_dir: site.sct_dir.clone(),
            user: parts.identity.user_spec(),
            group_ids: parts.identity.groups.clone(),
            extra_hosts: parts.mock.map(MockHosts::host_entries).unwrap_or_default(),
            tty: ctx.interactive_tty,
            entrypoint_command: parts.entrypoint_command,
        }
    }

    /// Render into the runtime command for `site`.
    pub fn to_command(&self, site: &ExecutionSite, tool: &ContainerTool) -> CommandSpec {
        let mut spec = site
            .runtime_command(tool)
            .args(["run", "--rm"])
            .arg(if self.tty { "-it" } else { "-i" })
            .arg("--privileged")
            .args(["-h", self.hostname.as_str()])
            .arg("--net=host")
            .arg(format!("--name={}", self.name));

        for mount in &self.mounts {
            spec = spec.arg("-v").arg(mount.to_arg());
        }
        for gid in &self.group_ids {
            spec = spec.args(["--group-add", gid.as_str()]);
        }
        for (host, ip) in &self.extra_hosts {
            spec = spec.arg("--add-host").arg(format!("{host}:{ip}"));
        }

        spec = spec.args(["-w", self.working_dir.as_str()]);
        spec = match tool.kind {
            RuntimeKind::Docker => spec.args(["-u", self.user.as_str()]),
            RuntimeKind::Podman => spec.arg("--userns=keep-id"),
        };

        for (k, v) in &self.env {
            spec = spec.arg("-e").arg(format!("{k}={v}"));
        }
        for name in &self.env_passthrough {
            spec = spec.args(["-e", name.as_str()]);
        }
        for (k, v) in &self.labels {
            spec = spec.arg("--label").arg(format!("{k}={v}"));
        }

        spec.arg(self.image_ref.as_str())
            .args(["/bin/bash", "-c", self.entrypoint_command.as_str()])
            .interactive()
    }
}
