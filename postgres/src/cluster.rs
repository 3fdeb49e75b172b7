use std::sync::Arc;

use log::{debug, info};

use ssh::{Outcome, Runner};

use crate::{ensure_success, PostgresError, Result};

/// Base path under which Debian-style PostgreSQL installations keep their
/// cluster data directories.
const DATA_BASE_PATH: &str = "/var/lib/postgresql";

/// Exit status of `pg_ctlcluster ... status` when the cluster is not running.
const STATUS_NOT_RUNNING: u32 = 3;

/// Drives the lifecycle of one PostgreSQL cluster through remote
/// `pg_ctlcluster` invocations.
///
/// The controller holds no state besides the cluster identity: every call is
/// a fresh remote command, so it can never act on a stale observation.
#[derive(Clone)]
pub struct Controller {
    runner: Arc<dyn Runner>,
    version: String,
    name: String,
}

impl Controller {
    pub fn new(runner: Arc<dyn Runner>, version: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            runner,
            version: version.into(),
            name: name.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the cluster's data directory, derived purely from the
    /// cluster identity.
    pub fn data_directory(&self) -> String {
        format!("{}/{}/{}", DATA_BASE_PATH, self.version, self.name)
    }

    /// Starts the cluster. Starting a running cluster is a success for
    /// `pg_ctlcluster`, so this is safe to call unconditionally.
    pub async fn start(&self) -> Result<()> {
        info!("starting cluster {}/{}", self.version, self.name);

        let output = self
            .runner
            .run(
                "sudo pg_ctlcluster {} {} start",
                &[self.version.as_str(), self.name.as_str()],
            )
            .await?;

        ensure_success("could not start cluster", &output)
    }

    /// Queries the cluster status.
    ///
    /// `pg_ctlcluster` exits with status 3 for a cluster that is down; that
    /// is a regular answer here, not an error. Every other failure is
    /// surfaced.
    pub async fn is_running(&self) -> Result<bool> {
        let output = self
            .runner
            .run(
                "sudo pg_ctlcluster {} {} status",
                &[self.version.as_str(), self.name.as_str()],
            )
            .await?;

        match output.outcome {
            Outcome::Success => Ok(true),
            Outcome::Failure {
                exit_code: Some(STATUS_NOT_RUNNING),
                ..
            } => Ok(false),
            Outcome::Failure { .. } => {
                Err(PostgresError::command("could not query cluster status", &output))
            }
        }
    }

    /// Stops the cluster. A cluster that is already down counts as stopped
    /// and no stop command is issued.
    pub async fn stop(&self) -> Result<()> {
        if !self.is_running().await? {
            debug!("cluster {}/{} is already stopped", self.version, self.name);
            return Ok(());
        }

        info!("stopping cluster {}/{}", self.version, self.name);

        let output = self
            .runner
            .run(
                "sudo pg_ctlcluster {} {} stop",
                &[self.version.as_str(), self.name.as_str()],
            )
            .await?;

        ensure_success("could not stop cluster", &output)
    }

    /// Removes everything below the data directory. The directory itself
    /// survives so a subsequent restore can repopulate it in place.
    pub async fn clear(&self) -> Result<()> {
        let data_directory = self.data_directory();
        info!("clearing data directory {data_directory}");

        let output = self
            .runner
            .run(
                "sudo -u postgres find {} -mindepth 1 -delete",
                &[data_directory.as_str()],
            )
            .await?;

        ensure_success("could not clear data directory", &output)
    }
}
