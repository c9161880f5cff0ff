//! The SQLite library database.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::sqlite::{
    SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::instrument;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Imports write one archive at a time; the extra connections are for
/// whatever reads the library meanwhile.
const POOL_SIZE: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-connection settings that `SqliteConnectOptions` has no builder for.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA wal_autocheckpoint = 1000;
    PRAGMA cache_size = -16384;
    PRAGMA temp_store = MEMORY;
";

/// A pool of connections to one library database, migrated to the current
/// schema. Build a [`Repository`](crate::Repository) from it to run queries.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::options().filename(path.as_ref()).create_if_missing(true);
        Self::open(options, SqlitePoolOptions::new().max_connections(POOL_SIZE)).await
    }

    /// A throwaway database for tests, in this crate and downstream.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::options().filename(":memory:");
        // Each connection to ":memory:" sees a different database. One
        // connection, never recycled, keeps the data alive.
        let pool = SqlitePoolOptions::new().min_connections(1).max_connections(1).idle_timeout(None).max_lifetime(None);
        Self::open(options, pool).await
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .auto_vacuum(SqliteAutoVacuum::None)
    }

    async fn open(options: SqliteConnectOptions, pool: SqlitePoolOptions) -> Result<Self> {
        let pool = pool
            // Runs for every connection the pool opens, not only the first.
            .after_connect(|conn, _| Box::pin(async move { Self::configure(conn).await }))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let database = Self { pool };
        database.migrate().await?;
        Ok(database)
    }

    async fn configure(conn: &mut SqliteConnection) -> sqlx::Result<()> {
        sqlx::query(CONNECTION_PRAGMAS).execute(conn).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Let SQLite refresh its planner statistics, then wait for every
    /// connection to come back and close them.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
