//! Scripted stand-in for the SSH runner.
#![allow(dead_code)] // not every test binary uses every helper

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use ssh::{Outcome, RunOutput, Runner, SshError};

enum Response {
    Output(RunOutput),
    Transport(String),
}

/// Pops one queued response per command and records every rendered command
/// line. When the script is exhausted, commands succeed with empty output.
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Response>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn push_success(&self, stdout: &str) {
        self.push(Response::Output(RunOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            outcome: Outcome::Success,
        }));
    }

    pub fn push_exit(&self, code: u32, stderr: &str) {
        self.push(Response::Output(RunOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            outcome: Outcome::Failure {
                exit_code: Some(code),
                message: format!("command exited with status {code}"),
            },
        }));
    }

    pub fn push_transport_failure(&self, message: &str) {
        self.push(Response::Transport(message.to_string()));
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn push(&self, response: Response) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl Runner for ScriptedRunner {
    async fn run(&self, command: &str, args: &[&str]) -> Result<RunOutput, SshError> {
        let rendered = ssh::render(command, args)?;
        self.commands.lock().unwrap().push(rendered);

        match self.responses.lock().unwrap().pop_front() {
            Some(Response::Output(output)) => Ok(output),
            Some(Response::Transport(message)) => Err(SshError::ConnectionError(message)),
            None => Ok(RunOutput {
                stdout: String::new(),
                stderr: String::new(),
                outcome: Outcome::Success,
            }),
        }
    }
}
