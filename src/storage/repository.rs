use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

use super::{LedgerSession, MIGRATION_001_INITIAL};

/// Owns the SQLite pool and hands out transactional sessions.
///
/// Every read and write goes through a [`LedgerSession`]; nothing queries
/// the pool directly, so a caller always sees whole entries or none.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        debug!(database_url, "connecting to ledger database");
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run against an existing database.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Open a read session backed by a deferred transaction.
    /// Dropping the session without committing rolls it back.
    pub async fn begin(&self) -> Result<LedgerSession> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(LedgerSession::new(tx))
    }

    /// Open a session that will write. Takes the write lock up front
    /// (`BEGIN IMMEDIATE`); concurrent writers wait on the busy timeout.
    pub async fn begin_write(&self) -> Result<LedgerSession> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("Failed to begin write transaction")?;
        Ok(LedgerSession::new(tx))
    }

    /// Raw pool access for maintenance tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
