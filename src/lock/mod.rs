// src/lock/mod.rs

//! Runner marker-file storage.
//!
//! The marker holds the IPv4 address of the currently provisioned runner.
//! Its presence is the only cross-invocation lock hydra has. The provisioning
//! step writes it; whoever is done with the runner deletes it.

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod memory;

pub use memory::MemoryLockStore;

/// Abstract marker storage.
pub trait LockStore: Send + Sync + Debug {
    /// Where the marker lives; used in user-facing messages.
    fn location(&self) -> &Path;

    /// Current marker contents (trimmed), or `None` if there is no marker.
    fn read(&self) -> Result<Option<String>>;

    fn write(&self, ip: &str) -> Result<()>;

    /// Remove the marker. Deleting a missing marker is not an error.
    fn delete(&self) -> Result<()>;
}

/// Marker stored as a plain file.
#[derive(Debug, Clone)]
pub struct FileLockStore {
    path: PathBuf,
}

impl FileLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LockStore for FileLockStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading runner marker {:?}", self.path)),
        }
    }

    fn write(&self, ip: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        fs::write(&self.path, format!("{ip}\n"))
            .with_context(|| format!("writing runner marker {:?}", self.path))
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing runner marker {:?}", self.path)),
        }
    }
}
