use thiserror::Error;

mod runner;
mod ssh;

pub use runner::{quote, render, Outcome, RunOutput, Runner};
pub use ssh::SshRunner;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("SSH configuration error: {0}")]
    ConfigurationError(String),
    #[error("SSH connection error: {0}")]
    ConnectionError(String),
    #[error("SSH authentication error: {0}")]
    AuthenticationError(String),
    #[error("command template error: {0}")]
    TemplateError(String),
}

impl From<std::io::Error> for SshError {
    fn from(err: std::io::Error) -> Self {
        SshError::ConnectionError(err.to_string())
    }
}

impl From<russh::Error> for SshError {
    fn from(err: russh::Error) -> Self {
        SshError::ConnectionError(err.to_string())
    }
}
