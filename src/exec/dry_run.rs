// src/exec/dry_run.rs

//! Runner that prints commands instead of executing them.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use anyhow::Context;

use crate::errors::Result;

use super::backend::CommandRunner;
use super::spec::{CommandOutput, CommandSpec};

/// Prints one rendered line per command and reports success with empty
/// output. Callers substitute placeholders for anything they would have read
/// from that output.
pub struct DryRunCommandRunner {
    out: Box<dyn Write + Send>,
}

impl DryRunCommandRunner {
    /// Print to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

impl Default for DryRunCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for DryRunCommandRunner {
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            writeln!(self.out, "{}", spec.render()).context("writing dry-run output")?;
            self.out.flush().context("flushing dry-run output")?;
            Ok(CommandOutput::success())
        })
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn prints_each_command_on_its_own_line() {
        let sink = Sink::default();
        let mut runner = DryRunCommandRunner::with_writer(Box::new(sink.clone()));

        let first = CommandSpec::new("ssh-agent").arg("-s");
        let second = CommandSpec::new("rsync").args(["-ar", "--delete"]);
        assert!(runner.run(&first).await.unwrap().is_success());
        runner.run(&second).await.unwrap();

        let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text, "ssh-agent -s\nrsync -ar --delete\n");
        assert!(runner.is_dry_run());
    }
}
