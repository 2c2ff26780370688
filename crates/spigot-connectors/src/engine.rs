//! Engine and connection management for the embedded source database.
//!
//! The engine wraps a process-wide connection pool over one database
//! file, opened read-only. It is created once and cloned freely; every
//! clone shares the same pool. Individual connections are lent out per
//! extraction worker via [`SourceEngine::acquire`] and return to the
//! pool when dropped, on every exit path.

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tracing::info;

use spigot_core::{SourceConfig, SourceError};

#[derive(Clone)]
pub struct SourceEngine {
    pool: SqlitePool,
}

impl SourceEngine {
    /// Open the engine for `config`.
    ///
    /// Fails with [`SourceError::Connection`] when the database file is
    /// missing or cannot be opened.
    pub async fn connect(config: &SourceConfig) -> Result<Self, SourceError> {
        if !config.path.is_file() {
            return Err(SourceError::connection(
                config.path.display().to_string(),
                "no such database file",
            ));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| SourceError::connection(config.path.display().to_string(), e))?;

        info!(
            "Opened source engine for '{}' (database '{}')",
            config.path.display(),
            config.database
        );

        Ok(Self { pool })
    }

    /// Borrow one connection from the pool. The connection is exclusively
    /// owned by the caller until dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, SourceError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| SourceError::connection("<pool>", e))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool and all idle connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::fixture_db;
    use sqlx::Row;

    #[tokio::test]
    async fn test_connect_missing_file() {
        let config = SourceConfig::new("/nonexistent/warehouse.db", "main").unwrap();
        let result = SourceEngine::connect(&config).await;
        assert!(matches!(result, Err(SourceError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_connect_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture_db(dir.path(), &["CREATE TABLE t (id INTEGER)"]).await;

        let config = SourceConfig::new(&path, "main").unwrap();
        let engine = SourceEngine::connect(&config).await.unwrap();

        let row = sqlx::query("SELECT 40 + 2 AS answer")
            .fetch_one(engine.pool())
            .await
            .unwrap();
        let answer: i64 = row.try_get("answer").unwrap();
        assert_eq!(answer, 42);

        engine.close().await;
    }

    #[tokio::test]
    async fn test_engine_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture_db(dir.path(), &["CREATE TABLE t (id INTEGER)"]).await;

        let config = SourceConfig::new(&path, "main").unwrap();
        let engine = SourceEngine::connect(&config).await.unwrap();

        let result = sqlx::query("INSERT INTO t (id) VALUES (1)")
            .execute(engine.pool())
            .await;
        assert!(result.is_err());

        engine.close().await;
    }

    #[tokio::test]
    async fn test_acquire_returns_connection_to_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture_db(dir.path(), &["CREATE TABLE t (id INTEGER)"]).await;

        let config = SourceConfig::new(&path, "main").unwrap();
        let engine = SourceEngine::connect(&config).await.unwrap();

        // Acquire and drop more connections than the pool holds; each
        // drop must release its slot or this would deadlock.
        for _ in 0..8 {
            let conn = engine.acquire().await.unwrap();
            drop(conn);
        }

        engine.close().await;
    }
}
