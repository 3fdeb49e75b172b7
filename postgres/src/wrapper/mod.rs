//! Adapters for the backup tools.
//!
//! Both tools speak the same restore vocabulary through [`BackupTool`]; the
//! stop → restore → start bracketing lives here, in one place, so no restore
//! path can forget it.

pub mod pgbackrest;
pub mod walg;

// Re-export for convenience
pub use pgbackrest::PgBackRest;
pub use walg::WalG;

use std::future::Future;

use async_trait::async_trait;

use crate::cluster::Controller;
use crate::common::RestoreTarget;
use crate::Result;

/// Capability shared by the backup tools.
#[async_trait]
pub trait BackupTool {
    /// Cluster the tool backs up and restores.
    fn cluster(&self) -> &Controller;

    /// Create a new backup of the cluster.
    async fn backup(&self) -> Result<()>;

    /// Issue the tool's restore commands. The cluster is stopped when this
    /// is called; go through [`BackupTool::restore_to`] instead.
    async fn run_restore(&self, target: &RestoreTarget) -> Result<()>;

    /// Restore the cluster to the given target.
    ///
    /// The cluster is stopped for the duration of the restore and running
    /// again when this returns `Ok`. A failure at any stage aborts the
    /// remaining stages, so the cluster may be left stopped on error.
    async fn restore_to(&self, target: &RestoreTarget) -> Result<()> {
        while_stopped(self.cluster(), self.run_restore(target)).await
    }
}

/// Runs `action` with the cluster stopped, starting it again afterwards.
///
/// `action` is not polled unless the stop succeeded, and the cluster is not
/// started unless `action` succeeded.
pub(crate) async fn while_stopped<F>(cluster: &Controller, action: F) -> Result<()>
where
    F: Future<Output = Result<()>> + Send,
{
    cluster.stop().await?;
    action.await?;
    cluster.start().await?;

    Ok(())
}
