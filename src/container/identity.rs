// src/container/identity.rs

//! The invoking user's identity on the container host.

use tracing::debug;

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::exec::{CommandRunner, run_checked};
use crate::runner::ExecutionSite;

const PLACEHOLDER_ID: &str = "1000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: String,
    pub gid: String,
    pub groups: Vec<String>,
}

impl UserIdentity {
    /// Parse the three lines printed by `id -u && id -g && id -G`.
    pub fn parse(output: &str) -> Result<Self> {
        let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
        let (Some(uid), Some(gid)) = (lines.next(), lines.next()) else {
            return Err(HydraError::Other(anyhow::anyhow!(
                "unexpected `id` output: {:?}",
                output
            )));
        };
        let groups = lines
            .next()
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        Ok(Self {
            uid: uid.to_string(),
            gid: gid.to_string(),
            groups,
        })
    }

    /// `uid:gid` for `--user`.
    pub fn user_spec(&self) -> String {
        format!("{}:{}", self.uid, self.gid)
    }
}

/// Query uid, gid and group membership on the site's host.
///
/// `HYDRA_GROUP_IDS` replaces the queried group list.
pub async fn query_identity(
    ctx: &RunnerContext,
    site: &ExecutionSite,
    runner: &mut dyn CommandRunner,
) -> Result<UserIdentity> {
    let spec = site.host_shell("id -u && id -g && id -G");
    let output = run_checked(runner, &spec).await?;

    let mut identity = if runner.is_dry_run() {
        UserIdentity {
            uid: PLACEHOLDER_ID.to_string(),
            gid: PLACEHOLDER_ID.to_string(),
            groups: Vec::new(),
        }
    } else {
        UserIdentity::parse(&output.stdout)?
    };

    if let Some(groups) = ctx.group_override() {
        debug!(?groups, "using group ids from HYDRA_GROUP_IDS");
        identity.groups = groups;
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_id_output() {
        let id = UserIdentity::parse("1000\n1001\n1001 27 998\n").unwrap();
        assert_eq!(id.user_spec(), "1000:1001");
        assert_eq!(id.groups, vec!["1001", "27", "998"]);
    }

    #[test]
    fn missing_lines_are_an_error() {
        assert!(UserIdentity::parse("1000\n").is_err());
    }
}
