// src/runner/provision.rs

//! Parameters for the external "create runner instance" step.

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::exec::CommandSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub cloud_provider: String,
    pub region: String,
    pub availability_zone: String,
    pub test_id: String,
    /// Minutes.
    pub duration: u32,
    pub restore_test_id: Option<String>,
}

impl ProvisionRequest {
    /// `[runner]` config values, overridden by `SCT_RUNNER_*` variables.
    pub fn from_context(ctx: &RunnerContext) -> Result<Self> {
        let cfg = &ctx.config.runner;
        let pick = |name: &str, default: &str| {
            ctx.var(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
                .trim()
                .to_string()
        };

        let duration = match ctx.var("SCT_RUNNER_DURATION") {
            Some(raw) => raw.trim().parse::<u32>().ok().filter(|d| *d > 0).ok_or_else(|| {
                HydraError::ConfigError(format!(
                    "SCT_RUNNER_DURATION must be a positive number of minutes (got {raw:?})"
                ))
            })?,
            None => cfg.duration,
        };

        Ok(Self {
            cloud_provider: pick("SCT_RUNNER_CLOUD_PROVIDER", &cfg.cloud_provider),
            region: pick("SCT_RUNNER_REGION", &cfg.region),
            availability_zone: pick("SCT_RUNNER_AVAILABILITY_ZONE", &cfg.availability_zone),
            test_id: ctx.test_id.clone(),
            duration,
            restore_test_id: ctx
                .var("SCT_RUNNER_RESTORE_TEST_ID")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        })
    }

    pub fn to_command(&self, program: &str) -> CommandSpec {
        let mut spec = CommandSpec::new(program)
            .arg("create-runner-instance")
            .args(["--cloud-provider", self.cloud_provider.as_str()])
            .args(["--region", self.region.as_str()])
            .args(["--availability-zone", self.availability_zone.as_str()])
            .args(["--test-id", self.test_id.as_str()])
            .arg("--duration")
            .arg(self.duration.to_string());
        if let Some(restore) = &self.restore_test_id {
            spec = spec
                .arg("--restore-monitor")
                .args(["--restored-test-id", restore.as_str()]);
        }
        spec
    }
}
