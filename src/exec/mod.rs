// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`spec`] holds `CommandSpec`, the structured form of every external
//!   command, plus shell quoting helpers used when rendering.
//! - [`backend`] provides the `CommandRunner` trait and the production
//!   `RealCommandRunner`.
//! - [`dry_run`] provides `DryRunCommandRunner`, used for `--dry-run-hydra`.

pub mod backend;
pub mod dry_run;
pub mod spec;

pub use backend::{CommandRunner, RealCommandRunner, run_checked};
pub use dry_run::DryRunCommandRunner;
pub use spec::{CommandOutput, CommandSpec, OutputMode, shell_escape, shell_join};
