// src/lock/memory.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use super::LockStore;

/// In-memory marker used by tests.
///
/// Clones share state, so a test can keep a handle and inspect the marker
/// after handing a clone to the dispatcher.
#[derive(Debug, Clone)]
pub struct MemoryLockStore {
    location: PathBuf,
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryLockStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// Start with an existing marker.
    pub fn with_ip(location: impl Into<PathBuf>, ip: &str) -> Self {
        Self {
            location: location.into(),
            value: Arc::new(Mutex::new(Some(ip.to_string()))),
        }
    }
}

impl LockStore for MemoryLockStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn read(&self) -> Result<Option<String>> {
        let guard = self.value.lock().map_err(|e| anyhow!("lock poisoned: {e}"))?;
        Ok(guard.as_ref().map(|v| v.trim().to_string()))
    }

    fn write(&self, ip: &str) -> Result<()> {
        let mut guard = self.value.lock().map_err(|e| anyhow!("lock poisoned: {e}"))?;
        *guard = Some(ip.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        let mut guard = self.value.lock().map_err(|e| anyhow!("lock poisoned: {e}"))?;
        *guard = None;
        Ok(())
    }
}
