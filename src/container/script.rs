// src/container/script.rs

//! The shell command run inside the container.

use crate::context::RunnerContext;
use crate::exec::shell_join;

/// Programs whose invocations are passed through as-is.
const DIRECT_PROGRAMS: [&str; 3] = ["bash", "sh", "python"];

/// Fragments executed before the user command, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparationScript {
    fragments: Vec<String>,
}

impl PreparationScript {
    /// Key fetch (skipped for `--help`), then for mock mode the CA install
    /// followed by a second key fetch that goes through the mocked keystore.
    pub fn build(ctx: &RunnerContext, help: bool, aws_mock: bool) -> Self {
        let fetch_keys = &ctx.config.container.key_fetch_command;
        let mut fragments = Vec::new();
        if !help {
            fragments.push(fetch_keys.clone());
        }
        if aws_mock {
            fragments.push(ctx.config.mock.ca_install_command.clone());
            if !help {
                fragments.push(fetch_keys.clone());
            }
        }
        Self { fragments }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Propagate the caller's terminal size, unless running headless.
pub fn terminal_fragment(ctx: &RunnerContext) -> Option<String> {
    if ctx.is_headless() {
        return None;
    }
    let dim = |name: &str| {
        ctx.var(name)
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
    };
    let (cols, lines) = (dim("COLUMNS")?, dim("LINES")?);
    Some(format!("export COLUMNS={cols} && export LINES={lines}"))
}

/// True when the command already starts with a shell or Python interpreter.
pub fn is_direct_invocation(command: &[String]) -> bool {
    let Some(first) = command.first() else {
        return false;
    };
    let program = first.rsplit('/').next().unwrap_or(first);
    DIRECT_PROGRAMS
        .iter()
        .any(|p| program == *p || (*p == "python" && program.starts_with("python")))
}

/// The user command: verbatim for direct invocations, otherwise wrapped in
/// the entrypoint with tool-level arguments first.
pub fn user_command(ctx: &RunnerContext, tool_args: &[String], command: &[String]) -> String {
    if is_direct_invocation(command) {
        return shell_join(command);
    }
    let mut line = ctx.config.container.entrypoint.clone();
    let rest: Vec<&String> = tool_args.iter().chain(command.iter()).collect();
    if !rest.is_empty() {
        line.push(' ');
        line.push_str(&shell_join(&rest));
    }
    line
}

/// Join preparation, terminal sizing and the user command into one line.
pub fn compose_command(
    script: &PreparationScript,
    terminal: Option<String>,
    user_command: &str,
) -> String {
    script
        .fragments()
        .iter()
        .cloned()
        .chain(terminal)
        .chain(std::iter::once(user_command.to_string()))
        .collect::<Vec<_>>()
        .join(" && ")
}
