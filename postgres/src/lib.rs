pub mod cluster;
pub mod common;
pub mod db;
pub mod parse;
pub mod wrapper;

use thiserror::Error;

use ssh::RunOutput;

#[derive(Error, Debug)]
pub enum PostgresError {
    /// The remote command ran and reported failure. The captured output is
    /// preserved verbatim so the failure can be diagnosed without re-running.
    #[error("{message}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    Command {
        message: String,
        stdout: String,
        stderr: String,
    },

    #[error("SSH transport error: {0}")]
    Transport(#[from] ssh::SshError),

    #[error("backup info is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("{tool} cannot restore to {target}")]
    UnsupportedTarget { tool: &'static str, target: String },
}

impl PostgresError {
    /// Remote command failure with its captured output attached.
    pub(crate) fn command(message: &str, output: &RunOutput) -> Self {
        let message = match &output.outcome {
            ssh::Outcome::Failure { message: cause, .. } => format!("{message}: {cause}"),
            ssh::Outcome::Success => message.to_string(),
        };

        PostgresError::Command {
            message,
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
        }
    }
}

/// Maps a failed remote outcome to [`PostgresError::Command`].
pub(crate) fn ensure_success(message: &str, output: &RunOutput) -> Result<()> {
    if output.is_success() {
        Ok(())
    } else {
        Err(PostgresError::command(message, output))
    }
}

pub type Result<T> = std::result::Result<T, PostgresError>;

// Re-export key types for convenience
pub use cluster::Controller;
pub use common::{BackupCatalog, BackupRecord, BackupStatus, BackupStatusInfo, RestoreTarget};
pub use wrapper::{BackupTool, PgBackRest, WalG};
