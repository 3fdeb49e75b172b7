use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use ssh::Runner;

use crate::cluster::Controller;
use crate::common::{BackupCatalog, RestoreTarget};
use crate::parse;
use crate::wrapper::{while_stopped, BackupTool};
use crate::{ensure_success, PostgresError, Result};

/// Drives WAL-G against the cluster's data directory.
///
/// WAL-G does not manage the recovery configuration itself, so this adapter
/// authors `recovery.conf`, and it does not delta-restore, so the data
/// directory is cleared before every fetch.
pub struct WalG {
    runner: Arc<dyn Runner>,
    cluster: Controller,
}

impl WalG {
    pub fn new(runner: Arc<dyn Runner>, cluster: Controller) -> Self {
        Self { runner, cluster }
    }

    /// Restore the most recent base backup.
    pub async fn restore_latest(&self) -> Result<()> {
        self.restore("LATEST").await
    }

    /// Restore the base backup with the given name.
    pub async fn restore(&self, name: &str) -> Result<()> {
        while_stopped(&self.cluster, self.fetch_backup(name)).await
    }

    /// Restore to the state right after the given transaction committed.
    ///
    /// Precondition: a prior [`WalG::restore`] has positioned a base backup
    /// in the data directory. This only writes the recovery configuration and
    /// replays from whatever base state is already there; it neither clears
    /// the directory nor fetches a backup.
    pub async fn restore_to_transaction(&self, transaction_id: u64) -> Result<()> {
        self.restore_to(&RestoreTarget::TransactionId(transaction_id))
            .await
    }

    /// Catalog of base backups, in the tool's listing order.
    pub async fn list(&self) -> Result<BackupCatalog> {
        let output = self
            .runner
            .run("sudo --login --user postgres wal-g backup-list", &[])
            .await?;

        ensure_success("could not list backups", &output)?;

        parse::parse_backup_list(&output.stdout)
    }

    /// Clears the data directory, fetches the named base backup into it, and
    /// authors the recovery configuration. The cluster must be stopped.
    async fn fetch_backup(&self, name: &str) -> Result<()> {
        info!("fetching base backup {name}");

        self.cluster.clear().await?;

        let data_directory = self.cluster.data_directory();
        let output = self
            .runner
            .run(
                "sudo --login --user postgres wal-g backup-fetch {} {}",
                &[data_directory.as_str(), name],
            )
            .await?;

        ensure_success("could not fetch backup", &output)?;

        self.write_restore_command().await
    }

    /// Writes the `recovery.conf` line telling PostgreSQL to fetch WAL
    /// segments through WAL-G.
    async fn write_restore_command(&self) -> Result<()> {
        let path = format!("{}/recovery.conf", self.cluster.data_directory());

        let output = self
            .runner
            .run(
                r#"echo "restore_command = 'bash --login -c \"wal-g wal-fetch %f %p\"'" | sudo --login --user postgres tee {}"#,
                &[path.as_str()],
            )
            .await?;

        ensure_success("could not write recovery.conf", &output)
    }

    async fn append_recovery_target_xid(&self, transaction_id: u64) -> Result<()> {
        let path = format!("{}/recovery.conf", self.cluster.data_directory());
        let line = format!("recovery_target_xid = {transaction_id}");

        let output = self
            .runner
            .run(
                "echo {} | sudo --login --user postgres tee --append {}",
                &[line.as_str(), path.as_str()],
            )
            .await?;

        ensure_success("could not append recovery target", &output)
    }
}

#[async_trait]
impl BackupTool for WalG {
    fn cluster(&self) -> &Controller {
        &self.cluster
    }

    /// Pushes a base backup of the data directory.
    async fn backup(&self) -> Result<()> {
        let data_directory = self.cluster.data_directory();
        info!("pushing base backup of {data_directory}");

        let output = self
            .runner
            .run(
                "sudo --login --user postgres wal-g backup-push {}",
                &[data_directory.as_str()],
            )
            .await?;

        ensure_success("backup failed", &output)
    }

    async fn run_restore(&self, target: &RestoreTarget) -> Result<()> {
        match target {
            RestoreTarget::Latest => self.fetch_backup("LATEST").await,
            RestoreTarget::TransactionId(id) => {
                info!("configuring recovery up to transaction {id}");

                self.write_restore_command().await?;
                self.append_recovery_target_xid(*id).await
            }
            other => Err(PostgresError::UnsupportedTarget {
                tool: "wal-g",
                target: other.to_string(),
            }),
        }
    }
}
