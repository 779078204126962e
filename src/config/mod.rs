// src/config/mod.rs

//! Configuration loading for `hydra.toml`.
//!
//! - [`model`] holds the serde shapes and their defaults.
//! - [`validate`] turns a `RawHydraConfig` into a checked `HydraConfig`.
//! - [`loader`] finds and reads the file.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, resolve};
pub use model::{
    ContainerSection, CredentialsSection, HydraConfig, ImageSection, MockSection, RawHydraConfig,
    RunnerSection, SshSection,
};
