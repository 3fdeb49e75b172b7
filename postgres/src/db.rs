//! Database-side helpers for verifying orchestration outcomes.

use log::error;
use tokio_postgres::{Client, NoTls};

use crate::{PostgresError, Result};

/// Connects to the given `postgres://` URL and drives the connection on a
/// background task.
pub async fn connect(url: &str) -> Result<Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls).await?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!("database connection error: {err}");
        }
    });

    Ok(client)
}

/// Numeric server version, e.g. 110005 for 11.5.
pub async fn server_version(client: &Client) -> Result<i64> {
    let row = client.query_one("SHOW server_version_num;", &[]).await?;
    let version: &str = row.get(0);

    version
        .parse()
        .map_err(|_| PostgresError::Parse(format!("server version '{version}' is not numeric")))
}

/// Creates a named restore point a later restore can target.
pub async fn create_restore_point(client: &Client, name: &str) -> Result<()> {
    client
        .execute("select pg_create_restore_point($1)", &[&name])
        .await?;

    Ok(())
}

/// Current transaction id, usable as an inclusive restore boundary.
pub async fn current_transaction_id(client: &Client) -> Result<i64> {
    let row = client.query_one("select txid_current()", &[]).await?;

    Ok(row.get(0))
}
