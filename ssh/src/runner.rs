use async_trait::async_trait;

use crate::SshError;

/// Result of one remote command whose dispatch succeeded.
///
/// A non-zero exit status is not an `Err` at this level; it is captured in
/// [`Outcome`] so callers can interpret well-known status codes themselves.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The remote process exited with status 0.
    Success,
    /// The remote process failed; `exit_code` is `None` when the channel
    /// closed without reporting a status.
    Failure {
        exit_code: Option<u32>,
        message: String,
    },
}

impl RunOutput {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// Remote exit status, when one was reported.
    pub fn exit_code(&self) -> Option<u32> {
        match &self.outcome {
            Outcome::Success => Some(0),
            Outcome::Failure { exit_code, .. } => *exit_code,
        }
    }
}

/// Executes a templated command on a remote host.
///
/// `command` uses positional `{}` markers which are substituted with `args`
/// in order, each one shell-quoted by [`render`]. A transport problem is an
/// `Err`; a command that ran and failed is an `Ok` with a failure [`Outcome`].
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, command: &str, args: &[&str]) -> Result<RunOutput, SshError>;
}

/// Substitutes `args` into the `{}` markers of `template`, quoting each value.
///
/// The number of markers must match the number of arguments.
pub fn render(template: &str, args: &[&str]) -> Result<String, SshError> {
    let parts: Vec<&str> = template.split("{}").collect();

    if parts.len() - 1 != args.len() {
        return Err(SshError::TemplateError(format!(
            "template '{}' has {} marker(s), but {} argument(s) were given",
            template,
            parts.len() - 1,
            args.len()
        )));
    }

    let mut rendered = String::with_capacity(template.len());
    for (i, part) in parts.iter().enumerate() {
        rendered.push_str(part);
        if let Some(arg) = args.get(i) {
            rendered.push_str(&quote(arg));
        }
    }

    Ok(rendered)
}

/// Quotes a value for safe interpolation into a shell command line.
///
/// Values made up entirely of unproblematic characters pass through
/// unchanged, so well-formed commands stay byte-identical to their hand
/// written form. Everything else is single-quoted.
pub fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_safe) {
        return value.to_string();
    }

    format!("'{}'", value.replace('\'', r"'\''"))
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}
