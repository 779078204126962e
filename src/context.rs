// src/context.rs

//! `RunnerContext`: everything a dispatch needs to know about the invoking
//! process, captured once and passed explicitly.
//!
//! Nothing below this module reads `std::env` directly; tests build a context
//! by hand (see `hydra-test-utils`).

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

use crate::config::HydraConfig;
use crate::errors::Result;

/// Environment prefixes forwarded into the container by name.
pub const FORWARDED_PREFIXES: [&str; 5] = ["SCT_", "PYTEST_", "BUILD_", "AWS_", "JENKINS_"];

#[derive(Debug, Clone)]
pub struct RunnerContext {
    /// Snapshot of the process environment.
    pub env: BTreeMap<String, String>,
    /// Local working tree (the directory hydra was started from).
    pub sct_dir: PathBuf,
    /// Local home directory.
    pub home: PathBuf,
    /// Invoking user name.
    pub user: String,
    pub config: HydraConfig,
    pub dry_run: bool,
    /// Whether stdin is attached to a terminal (`-it` vs `-i`).
    pub interactive_tty: bool,
    /// Effective test id.
    pub test_id: String,
    /// True when `test_id` was generated here rather than taken from
    /// `SCT_TEST_ID`; it then has to be exported to the container explicitly.
    pub test_id_generated: bool,
}

impl RunnerContext {
    /// Capture the current process state.
    pub fn from_process(config: HydraConfig, dry_run: bool) -> Result<Self> {
        let env: BTreeMap<String, String> = std::env::vars().collect();
        let sct_dir = std::env::current_dir().context("resolving current directory")?;
        let home = dirs::home_dir()
            .or_else(|| env.get("HOME").map(PathBuf::from))
            .context("could not determine the home directory")?;
        let interactive_tty = std::io::stdin().is_terminal();

        let ctx = Self::new(env, sct_dir, home, config, dry_run);
        Ok(ctx.with_tty(interactive_tty))
    }

    /// Build a context from explicit parts.
    ///
    /// The test id comes from `SCT_TEST_ID`; otherwise a random UUID is
    /// generated, or the nil UUID in dry-run mode so output stays stable.
    pub fn new(
        env: BTreeMap<String, String>,
        sct_dir: PathBuf,
        home: PathBuf,
        config: HydraConfig,
        dry_run: bool,
    ) -> Self {
        let user = env
            .get("USER")
            .or_else(|| env.get("LOGNAME"))
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let (test_id, test_id_generated) = match env.get("SCT_TEST_ID") {
            Some(id) if !id.trim().is_empty() => (id.trim().to_string(), false),
            _ if dry_run => (Uuid::nil().to_string(), true),
            _ => (Uuid::new_v4().to_string(), true),
        };

        Self {
            env,
            sct_dir,
            home,
            user,
            config,
            dry_run,
            interactive_tty: false,
            test_id,
            test_id_generated,
        }
    }

    pub fn with_tty(mut self, interactive_tty: bool) -> Self {
        self.interactive_tty = interactive_tty;
        self
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Names of all variables that are forwarded into the container, sorted.
    pub fn forwarded_env_names(&self) -> Vec<String> {
        self.env
            .keys()
            .filter(|name| is_forwarded(name))
            .cloned()
            .collect()
    }

    /// True when AWS credentials are available from the environment.
    pub fn has_aws_env_credentials(&self) -> bool {
        let set = |name: &str| self.var(name).is_some_and(|v| !v.is_empty());
        set("AWS_ACCESS_KEY_ID") && set("AWS_SECRET_ACCESS_KEY")
    }

    /// True when `SCT_CLUSTER_BACKEND` names a GCE/GKE backend.
    pub fn uses_gce_backend(&self) -> bool {
        self.var("SCT_CLUSTER_BACKEND")
            .is_some_and(|b| b.contains("gce") || b.contains("gke"))
    }

    /// True when running as the headless build-server user.
    pub fn is_headless(&self) -> bool {
        self.user == self.config.container.headless_user
    }

    /// Synthetic group ids from `HYDRA_GROUP_IDS`, if supplied.
    pub fn group_override(&self) -> Option<Vec<String>> {
        let raw = self.var("HYDRA_GROUP_IDS")?;
        let ids: Vec<String> = raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!ids.is_empty()).then_some(ids)
    }

    /// Resolve a config path relative to the local home directory.
    pub fn home_path(&self, rel: &str) -> PathBuf {
        let p = Path::new(rel);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.home.join(p)
        }
    }

    /// Absolute path of the runner marker file.
    pub fn runner_ip_file(&self) -> PathBuf {
        self.sct_dir.join(&self.config.runner.ip_file)
    }
}

/// True if `name` starts with one of [`FORWARDED_PREFIXES`].
pub fn is_forwarded(name: &str) -> bool {
    FORWARDED_PREFIXES.iter().any(|p| name.starts_with(p))
}
