// src/container/mock.rs

//! Mock cloud API discovery.
//!
//! The mock service presents a certificate whose Subject Alternative Names
//! list every hostname it impersonates. Each of those names is pinned to the
//! mock's address inside the test container.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::exec::{CommandRunner, run_checked};
use crate::runner::ExecutionSite;

use super::tool::ContainerTool;

/// Hostnames used in dry-run output instead of probing.
pub const DRY_RUN_MOCK_HOSTS: [&str; 3] = [
    "aws-mock.itself",
    "scylla-qa-keystore.s3.amazonaws.com",
    "ec2.eu-west-2.amazonaws.com",
];

/// Address used in dry-run output for the mock service.
pub const DRY_RUN_MOCK_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

static SAN_DNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DNS:([^,\s]+)").expect("SAN pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHosts {
    pub ip: Ipv4Addr,
    pub hostnames: Vec<String>,
}

impl MockHosts {
    /// The fixed mapping used when probing is skipped.
    pub fn dry_run() -> Self {
        Self {
            ip: DRY_RUN_MOCK_IP,
            hostnames: DRY_RUN_MOCK_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }

    /// `(hostname, ip)` overrides for the container.
    pub fn host_entries(&self) -> Vec<(String, String)> {
        self.hostnames
            .iter()
            .map(|h| (h.clone(), self.ip.to_string()))
            .collect()
    }
}

/// Locate the mock service on the site and read its certificate's names.
pub async fn discover_mock_hosts(
    ctx: &RunnerContext,
    site: &ExecutionSite,
    tool: &ContainerTool,
    runner: &mut dyn CommandRunner,
) -> Result<MockHosts> {
    let mock = &ctx.config.mock;
    let inspect = site.runtime_command(tool).args([
        "inspect",
        "--format",
        "{{ .NetworkSettings.IPAddress }}",
        mock.container_name.as_str(),
    ]);
    let output = run_checked(runner, &inspect).await?;

    let ip = if runner.is_dry_run() {
        DRY_RUN_MOCK_IP
    } else {
        let raw = output.stdout.trim();
        raw.parse::<Ipv4Addr>().map_err(|_| {
            HydraError::Other(anyhow::anyhow!(
                "mock service container `{}` has no usable IP address (got {:?})",
                mock.container_name,
                raw
            ))
        })?
    };

    let cert_query = site.host_shell(&format!(
        "openssl s_client -connect {ip}:{port} </dev/null 2>/dev/null | openssl x509 -noout -text",
        port = mock.port
    ));
    let output = run_checked(runner, &cert_query).await?;

    if runner.is_dry_run() {
        return Ok(MockHosts::dry_run());
    }

    let hostnames = parse_san_dns_names(&output.stdout);
    if hostnames.is_empty() {
        return Err(HydraError::Other(anyhow::anyhow!(
            "mock service at {ip} presented a certificate without DNS names"
        )));
    }
    info!(%ip, count = hostnames.len(), "mock hostnames discovered");
    Ok(MockHosts { ip, hostnames })
}

/// Every `DNS:` entry in `openssl x509 -text` output, in order, without
/// duplicates.
pub fn parse_san_dns_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in SAN_DNS.captures_iter(text) {
        let name = cap[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
