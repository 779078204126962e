// src/config/validate.rs

use crate::config::model::{HydraConfig, RawHydraConfig};
use crate::errors::{HydraError, Result};

impl TryFrom<RawHydraConfig> for HydraConfig {
    type Error = HydraError;

    fn try_from(raw: RawHydraConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(HydraConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawHydraConfig) -> Result<()> {
    validate_image(cfg)?;
    validate_runner(cfg)?;
    validate_ssh(cfg)?;
    validate_container(cfg)?;
    validate_mock(cfg)?;
    Ok(())
}

fn validate_image(cfg: &RawHydraConfig) -> Result<()> {
    let repo = cfg.image.repository.trim();
    if repo.is_empty() || repo.contains(char::is_whitespace) {
        return Err(HydraError::ConfigError(format!(
            "[image].repository must be a non-empty image name (got {:?})",
            cfg.image.repository
        )));
    }
    if let Some(tag) = &cfg.image.tag {
        if tag.trim().is_empty() || tag.contains(char::is_whitespace) {
            return Err(HydraError::ConfigError(format!(
                "[image].tag must not be blank or contain whitespace (got {:?})",
                tag
            )));
        }
    }
    Ok(())
}

fn validate_runner(cfg: &RawHydraConfig) -> Result<()> {
    let runner = &cfg.runner;
    for (field, value) in [
        ("ip_file", &runner.ip_file),
        ("user", &runner.user),
        ("provision_command", &runner.provision_command),
        ("cloud_provider", &runner.cloud_provider),
        ("region", &runner.region),
    ] {
        if value.trim().is_empty() {
            return Err(HydraError::ConfigError(format!(
                "[runner].{field} must not be empty"
            )));
        }
    }

    if runner.duration == 0 {
        return Err(HydraError::ConfigError(
            "[runner].duration must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_ssh(cfg: &RawHydraConfig) -> Result<()> {
    if cfg.ssh.keys.is_empty() {
        return Err(HydraError::ConfigError(
            "[ssh].keys must list at least one private key".to_string(),
        ));
    }
    if cfg.ssh.keys.iter().any(|k| k.trim().is_empty()) {
        return Err(HydraError::ConfigError(
            "[ssh].keys must not contain empty entries".to_string(),
        ));
    }
    Ok(())
}

fn validate_container(cfg: &RawHydraConfig) -> Result<()> {
    if cfg.container.entrypoint.trim().is_empty() {
        return Err(HydraError::ConfigError(
            "[container].entrypoint must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_mock(cfg: &RawHydraConfig) -> Result<()> {
    if cfg.mock.port == 0 {
        return Err(HydraError::ConfigError(
            "[mock].port must be a valid TCP port (got 0)".to_string(),
        ));
    }
    if cfg.mock.container_name.trim().is_empty() {
        return Err(HydraError::ConfigError(
            "[mock].container_name must not be empty".to_string(),
        ));
    }
    Ok(())
}
