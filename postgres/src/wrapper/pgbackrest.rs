use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;

use ssh::Runner;

use crate::cluster::Controller;
use crate::common::{BackupStatusInfo, RestoreTarget};
use crate::parse;
use crate::wrapper::BackupTool;
use crate::{ensure_success, Result};

/// Drives pgBackRest for one stanza.
///
/// The stanza is bound at construction, so one controller is scoped to
/// exactly one backup set for its whole life.
pub struct PgBackRest {
    runner: Arc<dyn Runner>,
    cluster: Controller,
    stanza: String,
}

impl PgBackRest {
    pub fn new(runner: Arc<dyn Runner>, cluster: Controller, stanza: impl Into<String>) -> Self {
        Self {
            runner,
            cluster,
            stanza: stanza.into(),
        }
    }

    pub fn stanza(&self) -> &str {
        &self.stanza
    }

    /// Summary of the backups pgBackRest holds for the stanza.
    ///
    /// A remote failure and unparseable tool output are reported as distinct
    /// errors, so callers can tell "the tool failed to run" from "the tool
    /// ran but said something we cannot understand".
    pub async fn info(&self) -> Result<Vec<BackupStatusInfo>> {
        let output = self
            .runner
            .run(
                "sudo -u postgres pgbackrest info --stanza={} --output=json",
                &[self.stanza.as_str()],
            )
            .await?;

        ensure_success("could not query backup info", &output)?;

        parse::parse_backup_info(&output.stdout)
    }

    /// Restore the latest backup.
    pub async fn restore(&self) -> Result<()> {
        self.restore_to(&RestoreTarget::Latest).await
    }

    /// Restore to the cluster state at the given point in time.
    pub async fn restore_to_point_in_time(&self, time: DateTime<Utc>) -> Result<()> {
        self.restore_to(&RestoreTarget::PointInTime(time)).await
    }

    /// Restore to a savepoint previously created with
    /// `pg_create_restore_point`.
    pub async fn restore_to_savepoint(&self, name: &str) -> Result<()> {
        self.restore_to(&RestoreTarget::NamedSavepoint(name.to_string()))
            .await
    }

    /// Restore to the state right after the given transaction committed.
    pub async fn restore_to_transaction(&self, transaction_id: u64) -> Result<()> {
        self.restore_to(&RestoreTarget::TransactionId(transaction_id))
            .await
    }
}

#[async_trait]
impl BackupTool for PgBackRest {
    fn cluster(&self) -> &Controller {
        &self.cluster
    }

    /// Incremental backup; pgBackRest falls back to a full backup when the
    /// stanza has none yet.
    async fn backup(&self) -> Result<()> {
        info!("creating pgBackRest backup for stanza {}", self.stanza);

        let output = self
            .runner
            .run(
                "sudo -u postgres pgbackrest --stanza={} backup --type=incr",
                &[self.stanza.as_str()],
            )
            .await?;

        ensure_success("backup failed", &output)
    }

    async fn run_restore(&self, target: &RestoreTarget) -> Result<()> {
        info!("restoring stanza {} to {}", self.stanza, target);

        let output = match target.recovery_clause() {
            None => {
                self.runner
                    .run(
                        "sudo -u postgres pgbackrest --stanza={} --delta restore",
                        &[self.stanza.as_str()],
                    )
                    .await?
            }
            Some((kind, value)) => {
                self.runner
                    .run(
                        "sudo -u postgres pgbackrest --stanza={} --delta --type={} --target={} restore",
                        &[self.stanza.as_str(), kind, value.as_str()],
                    )
                    .await?
            }
        };

        ensure_success("restore failed", &output)
    }
}
