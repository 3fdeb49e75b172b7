use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health summary for one pgBackRest stanza, as reported by `pgbackrest info`.
///
/// Field names mirror the tool's JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupStatusInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Status")]
    pub status: BackupStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupStatus {
    #[serde(rename = "Code")]
    pub code: i64,
    #[serde(rename = "Message")]
    pub message: String,
}

impl BackupStatusInfo {
    /// Code 0 with message "ok" signals a healthy stanza.
    pub fn is_healthy(&self) -> bool {
        self.status.code == 0 && self.status.message == "ok"
    }
}

/// Everything WAL-G has backed up, in the tool's listing order.
#[derive(Debug, Clone, Serialize)]
pub struct BackupCatalog {
    pub storage_path: String,
    pub backups: Vec<BackupRecord>,
}

/// One base backup, constructed only by the list parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub wal_segment_backup_start: String,
}

/// Where a restore should stop replaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    /// Play the archive forward to its end.
    Latest,
    PointInTime(DateTime<Utc>),
    /// A label previously created with `pg_create_restore_point`.
    NamedSavepoint(String),
    /// Replay includes all effects of this transaction.
    TransactionId(u64),
}

impl RestoreTarget {
    /// pgBackRest recovery target type and serialized value, for targets
    /// other than [`RestoreTarget::Latest`].
    pub(crate) fn recovery_clause(&self) -> Option<(&'static str, String)> {
        match self {
            RestoreTarget::Latest => None,
            RestoreTarget::PointInTime(time) => Some((
                "time",
                time.to_rfc3339_opts(SecondsFormat::Nanos, false),
            )),
            RestoreTarget::NamedSavepoint(name) => Some(("name", name.clone())),
            RestoreTarget::TransactionId(id) => Some(("xid", id.to_string())),
        }
    }
}

impl fmt::Display for RestoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreTarget::Latest => write!(f, "the latest backup"),
            RestoreTarget::PointInTime(time) => {
                write!(f, "point in time {}", time.to_rfc3339_opts(SecondsFormat::Nanos, false))
            }
            RestoreTarget::NamedSavepoint(name) => write!(f, "savepoint {name}"),
            RestoreTarget::TransactionId(id) => write!(f, "transaction {id}"),
        }
    }
}
