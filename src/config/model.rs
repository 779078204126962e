// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from `hydra.toml`.
///
/// ```toml
/// [image]
/// repository = "scylladb/hydra"
/// tag = "v1.93-update-k8s"
///
/// [runner]
/// user = "ubuntu"
/// region = "eu-west-1"
///
/// [ssh]
/// keys = [".ssh/scylla-qa-ec2", ".ssh/scylla-test"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the raw
/// shape; [`HydraConfig`] is the validated form the rest of the crate uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawHydraConfig {
    #[serde(default)]
    pub image: ImageSection,

    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub ssh: SshSection,

    #[serde(default)]
    pub credentials: CredentialsSection,

    #[serde(default)]
    pub container: ContainerSection,

    #[serde(default)]
    pub mock: MockSection,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct HydraConfig {
    pub image: ImageSection,
    pub runner: RunnerSection,
    pub ssh: SshSection,
    pub credentials: CredentialsSection,
    pub container: ContainerSection,
    pub mock: MockSection,
}

impl HydraConfig {
    /// Build a config without running validation.
    ///
    /// Used by `TryFrom<RawHydraConfig>` once validation has passed.
    pub(crate) fn new_unchecked(raw: RawHydraConfig) -> Self {
        Self {
            image: raw.image,
            runner: raw.runner,
            ssh: raw.ssh,
            credentials: raw.credentials,
            container: raw.container,
            mock: raw.mock,
        }
    }
}

impl Default for HydraConfig {
    fn default() -> Self {
        Self::new_unchecked(RawHydraConfig::default())
    }
}

/// `[image]` section: which hydra image to run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Explicit tag. When absent the tag is `v<version>`, where `<version>`
    /// is read from `version_file` inside the working tree.
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default = "default_version_file")]
    pub version_file: String,
}

fn default_repository() -> String {
    "scylladb/hydra".to_string()
}

fn default_version_file() -> String {
    "docker/env/version".to_string()
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            tag: None,
            version_file: default_version_file(),
        }
    }
}

/// `[runner]` section: remote runner provisioning and access.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    /// Marker file, relative to the working tree, holding the active
    /// runner's IP.
    #[serde(default = "default_ip_file")]
    pub ip_file: String,

    /// Login user on the runner host.
    #[serde(default = "default_runner_user")]
    pub user: String,

    /// Program invoked with `create-runner-instance ...` to provision.
    #[serde(default = "default_provision_command")]
    pub provision_command: String,

    #[serde(default = "default_cloud_provider")]
    pub cloud_provider: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_availability_zone")]
    pub availability_zone: String,

    /// Runner lifetime budget in minutes.
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_ip_file() -> String {
    "sct_runner_ip".to_string()
}

fn default_runner_user() -> String {
    "ubuntu".to_string()
}

fn default_provision_command() -> String {
    "./sct.py".to_string()
}

fn default_cloud_provider() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "eu-west-1".to_string()
}

fn default_availability_zone() -> String {
    "a".to_string()
}

fn default_duration() -> u32 {
    1440
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            ip_file: default_ip_file(),
            user: default_runner_user(),
            provision_command: default_provision_command(),
            cloud_provider: default_cloud_provider(),
            region: default_region(),
            availability_zone: default_availability_zone(),
            duration: default_duration(),
        }
    }
}

/// `[ssh]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSection {
    /// Private keys loaded into the agent, relative to `$HOME` unless
    /// absolute.
    #[serde(default = "default_ssh_keys")]
    pub keys: Vec<String>,
}

fn default_ssh_keys() -> Vec<String> {
    vec![
        ".ssh/scylla-qa-ec2".to_string(),
        ".ssh/scylla-test".to_string(),
    ]
}

impl Default for SshSection {
    fn default() -> Self {
        Self {
            keys: default_ssh_keys(),
        }
    }
}

/// `[credentials]` section. Paths are relative to `$HOME`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsSection {
    #[serde(default = "default_aws_dir")]
    pub aws_dir: String,

    #[serde(default = "default_aws_file")]
    pub aws_file: String,

    #[serde(default = "default_gce_file")]
    pub gce_file: String,
}

fn default_aws_dir() -> String {
    ".aws".to_string()
}

fn default_aws_file() -> String {
    "credentials".to_string()
}

fn default_gce_file() -> String {
    ".google_libcloud_auth.skilled-adapter-452".to_string()
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            aws_dir: default_aws_dir(),
            aws_file: default_aws_file(),
            gce_file: default_gce_file(),
        }
    }
}

/// `[container]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSection {
    /// Test-runner entrypoint used when the command is not a direct shell or
    /// interpreter invocation.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,

    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_remote_hostname")]
    pub remote_hostname: String,

    /// User name of the headless build server; no terminal sizing for it.
    #[serde(default = "default_headless_user")]
    pub headless_user: String,

    /// Shell fragment that fetches the QA SSH keys inside the container.
    #[serde(default = "default_key_fetch_command")]
    pub key_fetch_command: String,
}

fn default_entrypoint() -> String {
    "./sct.py".to_string()
}

fn default_hostname() -> String {
    "SCT-CONTAINER".to_string()
}

fn default_remote_hostname() -> String {
    "SCT-CONTAINER-RUNNER".to_string()
}

fn default_headless_user() -> String {
    "jenkins".to_string()
}

fn default_key_fetch_command() -> String {
    "./get-qa-ssh-keys.sh".to_string()
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            entrypoint: default_entrypoint(),
            hostname: default_hostname(),
            remote_hostname: default_remote_hostname(),
            headless_user: default_headless_user(),
            key_fetch_command: default_key_fetch_command(),
        }
    }
}

/// `[mock]` section: the simulated cloud API service.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockSection {
    #[serde(default = "default_mock_container")]
    pub container_name: String,

    #[serde(default = "default_mock_port")]
    pub port: u16,

    /// Shell fragment installing the mock CA into the container trust store.
    #[serde(default = "default_ca_install_command")]
    pub ca_install_command: String,
}

fn default_mock_container() -> String {
    "aws_mock".to_string()
}

fn default_mock_port() -> u16 {
    443
}

fn default_ca_install_command() -> String {
    "sudo cp -f ./aws_mock/ca.crt /usr/local/share/ca-certificates/aws-mock.crt \
     && sudo update-ca-certificates"
        .to_string()
}

impl Default for MockSection {
    fn default() -> Self {
        Self {
            container_name: default_mock_container(),
            port: default_mock_port(),
            ca_install_command: default_ca_install_command(),
        }
    }
}
