// src/exec/spec.rs

//! Structured description of one external command.
//!
//! Commands are built as token lists plus an explicit environment map and
//! are only turned into a string at the boundary: when printed in dry-run
//! mode or logged. Rendering is a pure function of the spec.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// How the child's stdio is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// stdin is `/dev/null`, stdout/stderr are captured.
    #[default]
    Captured,
    /// stdio is inherited from hydra (the container run).
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            output: OutputMode::Captured,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn interactive(mut self) -> Self {
        self.output = OutputMode::Interactive;
        self
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_envs(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output
    }

    /// True if any argument equals `token`.
    pub fn has_arg(&self, token: &str) -> bool {
        self.args.iter().any(|a| a == token)
    }

    /// Render as a single shell line: `KEY=VALUE ... program args...`.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.env.len() + self.args.len() + 1);
        for (k, v) in &self.env {
            parts.push(format!("{k}={}", shell_escape(v)));
        }
        parts.push(shell_escape(&self.program).into_owned());
        parts.extend(self.args.iter().map(|a| shell_escape(a).into_owned()));
        parts.join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Output carrying only an exit status.
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-./:=@,+%".contains(c)
}

/// Quote `arg` for a POSIX shell, leaving plain words untouched.
pub fn shell_escape(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return Cow::Borrowed(arg);
    }
    let escaped = arg.replace('\'', "'\\''");
    Cow::Owned(format!("'{}'", escaped))
}

/// Quote and join a token list into one shell string.
pub fn shell_join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| shell_escape(a.as_ref()).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
