// src/container/tool.rs

//! Container runtime detection.

use std::path::Path;

use tracing::debug;

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::runner::RemoteHost;

/// Candidates searched on `PATH`, in order of preference.
const CANDIDATES: [&str; 2] = ["docker", "podman"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Docker,
    Podman,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTool {
    pub program: String,
    pub kind: RuntimeKind,
}

impl ContainerTool {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let kind = if Path::new(&program)
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains("podman"))
        {
            RuntimeKind::Podman
        } else {
            RuntimeKind::Docker
        };
        Self { program, kind }
    }

    /// `HYDRA_TOOL` if set, otherwise the first of docker/podman on `PATH`.
    pub fn detect(ctx: &RunnerContext) -> Result<Self> {
        if let Some(tool) = ctx.var("HYDRA_TOOL").map(str::trim).filter(|t| !t.is_empty()) {
            debug!(tool, "container tool from HYDRA_TOOL");
            return Ok(Self::new(tool));
        }

        let path = ctx.var("PATH").unwrap_or_default();
        for candidate in CANDIDATES {
            if std::env::split_paths(path).any(|dir| dir.join(candidate).is_file()) {
                debug!(tool = candidate, "container tool found on PATH");
                return Ok(Self::new(candidate));
            }
        }

        Err(HydraError::ToolingError(
            "neither docker nor podman was found; install one of them or set HYDRA_TOOL"
                .to_string(),
        ))
    }

    /// Arguments pointing the tool at a remote daemon over SSH.
    pub fn remote_host_args(&self, host: &RemoteHost) -> Vec<String> {
        let url = format!("ssh://{}", host.destination());
        match self.kind {
            RuntimeKind::Docker => vec!["-H".to_string(), url],
            RuntimeKind::Podman => vec!["--remote".to_string(), "--url".to_string(), url],
        }
    }
}
