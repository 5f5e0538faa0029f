use anyhow::{Context, Result};
use sqlx::{Connection, PgConnection};
use tracing::info;

/// Opens the single PostgreSQL connection held for the whole run.
pub async fn connect(database_url: &str) -> Result<PgConnection> {
    info!("Connecting to PostgreSQL...");

    let conn = PgConnection::connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection established");
    Ok(conn)
}
