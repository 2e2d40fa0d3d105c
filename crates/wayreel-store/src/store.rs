//! C1 Store (spec §4.2): transactions, single-row reads, iterator queries,
//! batched writes, over a single-writer/many-reader SQLite pool.

use std::future::Future;
use std::pin::Pin;

use sqlx::sqlite::Sqlite;
use sqlx::{Executor, SqlitePool, Transaction};

use crate::error::Result;

pub struct Store {
    pub(crate) pool: SqlitePool,
    /// Serializes writer transactions application-side so concurrent
    /// workers never interleave writes even though the pool itself allows
    /// multiple connections (spec §4.2, §5: "Must honor a single writer at
    /// a time; readers are unrestricted.").
    writer: tokio::sync::Mutex<()>,
}

type TxFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>;

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on
    /// `Err`. Only one `tx` call runs at a time across the whole `Store`.
    pub async fn tx<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut Transaction<'_, Sqlite>) -> TxFuture<'c, T>,
    {
        let _guard = self.writer.lock().await;
        let mut txn = self.pool.begin().await?;
        match f(&mut txn).await {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(e) => {
                let _ = txn.rollback().await;
                Err(e)
            }
        }
    }

    /// Fetch at most one row via a raw query executed against the read
    /// pool. Callers build the `sqlx::query_as` themselves and pass it in
    /// so this stays generic over row types.
    pub async fn get<'q, T>(
        &self,
        query: sqlx::query::QueryAs<'q, Sqlite, T, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> Result<Option<T>>
    where
        T: Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>,
    {
        Ok(query.fetch_optional(&self.pool).await?)
    }

    /// Fetch all matching rows.
    pub async fn query<'q, T>(
        &self,
        query: sqlx::query::QueryAs<'q, Sqlite, T, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> Result<Vec<T>>
    where
        T: Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>,
    {
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Execute a batch of write statements in one transaction — used for
    /// bulk upserts like the Scout's child-snapshot inserts.
    pub async fn exec_many<'q, I>(&self, statements: I) -> Result<()>
    where
        I: IntoIterator<Item = sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>>,
    {
        let _guard = self.writer.lock().await;
        let mut txn = self.pool.begin().await?;
        for stmt in statements {
            txn.execute(stmt).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// `is_url_key_allowed` fallback (spec §9): query the allow/deny tables
    /// directly rather than registering a SQL scalar function. A host is
    /// allowed unless explicitly denied, or if an allow-list exists and it
    /// is absent from it.
    pub async fn is_host_allowed(&self, host: &str) -> Result<bool> {
        let denied: Option<(String,)> = sqlx::query_as("SELECT host FROM denied_host WHERE host = ?")
            .bind(host)
            .fetch_optional(&self.pool)
            .await?;
        if denied.is_some() {
            return Ok(false);
        }
        let (allow_list_size,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM allowed_host")
            .fetch_one(&self.pool)
            .await?;
        if allow_list_size == 0 {
            return Ok(true);
        }
        let allowed: Option<(String,)> = sqlx::query_as("SELECT host FROM allowed_host WHERE host = ?")
            .bind(host)
            .fetch_optional(&self.pool)
            .await?;
        Ok(allowed.is_some())
    }
}
