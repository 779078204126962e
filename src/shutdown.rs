// src/shutdown.rs

//! Termination signals observed while hydra holds an SSH agent.
//!
//! Handlers are installed before the agent is started, so a signal that
//! arrives before anyone waits on it is still delivered rather than killing
//! the process through the default disposition.

#[cfg(unix)]
use anyhow::Context;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

use crate::errors::{HydraError, Result};

pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignals {
    /// Install SIGINT and SIGTERM handlers.
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        let interrupt =
            signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
        let terminate =
            signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        Ok(Self {
            interrupt,
            terminate,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next signal and return the error it maps to.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> HydraError {
        tokio::select! {
            _ = self.interrupt.recv() => HydraError::Interrupted,
            _ = self.terminate.recv() => HydraError::Terminated,
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> HydraError {
        match tokio::signal::ctrl_c().await {
            Ok(()) => HydraError::Interrupted,
            Err(_) => std::future::pending().await,
        }
    }
}
