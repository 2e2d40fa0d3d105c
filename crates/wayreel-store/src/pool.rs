//! Connection setup (spec §5, §9): WAL journal mode, `synchronous=NORMAL`,
//! foreign keys on, one logical writer serialized through a mutex, readers
//! unrestricted through a pool. Modeled on
//! `rootsignal-archive::store::ArchiveStore::migrate`'s use of
//! `sqlx::migrate!`, adapted from Postgres to the embedded SQLite file spec
//! §6 calls for.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error::{Result, StoreError};

/// Open (creating if absent) the SQLite database at `path`, apply pragmas,
/// and run embedded migrations.
pub async fn connect(path: impl AsRef<Path>) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.as_ref().display()))
        .map_err(|e| StoreError::Database(e.to_string()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(pool)
}
