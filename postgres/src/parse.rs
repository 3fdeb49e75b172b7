//! Parsers for the backup tools' command output.
//!
//! Both parsers fail loudly on malformed input: a catalog is either complete
//! or absent, never partially populated.

use chrono::{DateTime, Utc};

use crate::common::{BackupCatalog, BackupRecord, BackupStatusInfo};
use crate::{PostgresError, Result};

/// Parses the JSON emitted by `pgbackrest info --output=json`.
pub fn parse_backup_info(stdout: &str) -> Result<Vec<BackupStatusInfo>> {
    Ok(serde_json::from_str(stdout)?)
}

/// Parses the tabular output of `wal-g backup-list`.
///
/// The first line is a `label: path` header, the second names the columns,
/// and every following non-empty line describes one backup as a
/// whitespace-separated `name timestamp wal-segment` triple.
pub fn parse_backup_list(stdout: &str) -> Result<BackupCatalog> {
    let lines: Vec<&str> = stdout.split('\n').collect();

    if lines.len() < 2 {
        return Err(PostgresError::Parse(format!(
            "expected a path line and a column header, but got {} line(s)",
            lines.len()
        )));
    }

    let storage_path = parse_path_line(lines[0])?;

    let backups = lines[2..]
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| parse_backup_line(line))
        .collect::<Result<Vec<_>>>()?;

    Ok(BackupCatalog {
        storage_path,
        backups,
    })
}

fn parse_path_line(line: &str) -> Result<String> {
    match line.split_once(':') {
        Some((_, path)) => Ok(path.trim().to_string()),
        None => Err(PostgresError::Parse(format!(
            "path line '{line}' has no ':' separator"
        ))),
    }
}

fn parse_backup_line(line: &str) -> Result<BackupRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.len() != 3 {
        return Err(PostgresError::Parse(format!(
            "backup line '{line}' has {} field(s), expected 3",
            fields.len()
        )));
    }

    let last_modified = DateTime::parse_from_rfc3339(fields[1])
        .map_err(|err| {
            PostgresError::Parse(format!("backup line '{line}' has a bad timestamp: {err}"))
        })?
        .with_timezone(&Utc);

    Ok(BackupRecord {
        name: fields[0].to_string(),
        last_modified,
        wal_segment_backup_start: fields[2].to_string(),
    })
}
