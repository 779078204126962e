use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use hydra::errors::Result;
use hydra::exec::{CommandOutput, CommandRunner, CommandSpec};

/// `id -u; id -g; id -G` for a user in the docker group.
const IDS: &str = "1000\n1000\n1000 998\n";

/// A scripted response: first matching rule wins.
#[derive(Debug, Clone)]
struct Rule {
    program: String,
    needle: Option<String>,
    output: CommandOutput,
}

impl Rule {
    fn matches(&self, spec: &CommandSpec) -> bool {
        if spec.get_program() != self.program {
            return false;
        }
        match &self.needle {
            Some(needle) => spec.get_args().iter().any(|a| a.contains(needle.as_str())),
            None => true,
        }
    }
}

/// A fake runner that:
/// - records every command it is asked to run
/// - answers with scripted outputs, or success with empty output otherwise.
///
/// Clones share the recording, so a test can keep one handle and give the
/// other to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    rules: Arc<Mutex<Vec<Rule>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner pre-scripted with the outputs a healthy remote run needs.
    pub fn healthy() -> Self {
        let runner = Self::new();
        runner.respond(
            "ssh-agent",
            Some("-s"),
            CommandOutput::with_stdout(
                "SSH_AUTH_SOCK=/tmp/ssh-test/agent.1; export SSH_AUTH_SOCK;\n\
                 SSH_AGENT_PID=4242; export SSH_AGENT_PID;\n",
            ),
        );
        for program in ["sh", "ssh"] {
            runner.respond(program, Some("id -u"), CommandOutput::with_stdout(IDS));
        }
        runner
    }

    /// Answer commands of `program` (whose arguments contain `needle`, if
    /// given) with `output`. Earlier rules take precedence.
    pub fn respond(&self, program: &str, needle: Option<&str>, output: CommandOutput) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            program: program.to_string(),
            needle: needle.map(str::to_string),
            output,
        });
        self
    }

    /// Make matching commands exit with `code`.
    pub fn fail(&self, program: &str, needle: Option<&str>, code: i32) -> &Self {
        self.rules.lock().unwrap().insert(
            0,
            Rule {
                program: program.to_string(),
                needle: needle.map(str::to_string),
                output: CommandOutput::from_code(code),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::render).collect()
    }

    /// Number of recorded commands of `program` containing `arg` exactly.
    pub fn count(&self, program: &str, arg: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.get_program() == program && c.has_arg(arg))
            .count()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.get_program().to_string())
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        let calls = Arc::clone(&self.calls);
        let rules = Arc::clone(&self.rules);

        Box::pin(async move {
            calls.lock().unwrap().push(spec.clone());
            let output = rules
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.matches(spec))
                .map(|r| r.output.clone())
                .unwrap_or_default();
            Ok(output)
        })
    }
}
