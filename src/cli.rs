// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Hydra's own flags must come before the positional sub-command. Everything
//! from the first positional token onwards is forwarded verbatim to the
//! command run inside the container.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};

/// Command-line arguments for `hydra`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "hydra",
    version,
    about = "Run the cluster-test container locally or on a remote runner.",
    long_about = None,
    disable_help_flag = true
)]
pub struct CliArgs {
    /// Provision a new remote runner and execute there.
    #[arg(long)]
    pub execute_on_new_runner: bool,

    /// Execute on an already provisioned runner (IPv4 address).
    #[arg(long, value_name = "IP")]
    pub execute_on_runner: Option<String>,

    /// Redirect cloud API hostnames to the mock service and trust its CA.
    #[arg(long)]
    pub aws_mock: bool,

    /// Print every external command instead of running it.
    #[arg(long)]
    pub dry_run_hydra: bool,

    /// Forwarded to the container entrypoint.
    #[arg(long, value_name = "PATH")]
    pub install_package_from_directory: Option<String>,

    /// Forwarded to the container entrypoint.
    #[arg(long)]
    pub install_bash_completion: bool,

    /// Forwarded to the container entrypoint; skips the SSH key pre-fetch.
    #[arg(long, action = ArgAction::SetTrue)]
    pub help: bool,

    /// Path to `hydra.toml`.
    ///
    /// Default: `hydra.toml` in the working tree, if present.
    #[arg(long, value_name = "PATH", env = "HYDRA_CONFIG")]
    pub hydra_config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HYDRA_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub hydra_log_level: Option<LogLevel>,

    /// Sub-command and its arguments, forwarded verbatim.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,

    /// Entrypoint-level flags in the order they were given.
    #[arg(skip)]
    pub tool_args: Vec<String>,
}

impl CliArgs {
    /// True when help was requested either as a hydra flag or inside the
    /// forwarded command.
    pub fn wants_help(&self) -> bool {
        self.help || self.command.iter().any(|a| a == "--help" || a == "-h")
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse the process arguments, exiting with clap's usage error on failure.
pub fn parse() -> CliArgs {
    match try_parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => err.exit(),
    }
}

/// Parse arguments from an explicit iterator.
///
/// Unlike the derived `parse_from`, this also records the entrypoint-level
/// flags (`--install-*`, `--help`) in their original relative order.
pub fn try_parse_from<I, T>(itr: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(itr)?;
    let mut args = CliArgs::from_arg_matches(&matches)?;
    args.tool_args = ordered_tool_args(&matches);
    Ok(args)
}

fn ordered_tool_args(matches: &ArgMatches) -> Vec<String> {
    let mut found: Vec<(usize, Vec<String>)> = Vec::new();

    for (id, flag) in [
        ("install_bash_completion", "--install-bash-completion"),
        ("help", "--help"),
    ] {
        if let Some(idx) = given_index(matches, id) {
            found.push((idx, vec![flag.to_string()]));
        }
    }

    if let Some(idx) = given_index(matches, "install_package_from_directory") {
        if let Some(path) = matches.get_one::<String>("install_package_from_directory") {
            found.push((
                idx,
                vec!["--install-package-from-directory".to_string(), path.clone()],
            ));
        }
    }

    found.sort_by_key(|(idx, _)| *idx);
    found.into_iter().flat_map(|(_, tokens)| tokens).collect()
}

fn given_index(matches: &ArgMatches, id: &str) -> Option<usize> {
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }
    matches.index_of(id)
}
