// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{HydraConfig, RawHydraConfig};
use crate::errors::Result;

/// File name looked up in the working tree when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hydra.toml";

/// Load a configuration file from a given path and return the raw
/// `RawHydraConfig`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawHydraConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawHydraConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<HydraConfig> {
    let raw_config = load_from_path(&path)?;
    let config = HydraConfig::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the effective configuration.
///
/// - An explicit path must exist and be valid.
/// - Otherwise `hydra.toml` in `sct_dir` is used if present.
/// - Otherwise built-in defaults apply.
pub fn resolve(explicit: Option<&Path>, sct_dir: &Path) -> Result<HydraConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit hydra config");
        return load_and_validate(path);
    }

    let candidate = default_config_path(sct_dir);
    if candidate.is_file() {
        debug!(path = %candidate.display(), "loading hydra config from working tree");
        return load_and_validate(&candidate);
    }

    debug!("no hydra config found; using defaults");
    Ok(HydraConfig::default())
}

/// Default config location inside the working tree.
pub fn default_config_path(sct_dir: &Path) -> PathBuf {
    sct_dir.join(DEFAULT_CONFIG_FILE)
}
