//! Append-only search usage log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{ArcherError, ArcherResult};
use crate::types::SearchUsage;

/// Trait for the usage log backing the rate limiter.
///
/// Records are append-only and never mutated; the limiter only ever counts
/// them within a time window.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Append one usage record.
    async fn append(&self, usage: &SearchUsage) -> ArcherResult<()>;

    /// Count records with `timestamp >= since`, across all users.
    async fn count_since(&self, since: DateTime<Utc>) -> ArcherResult<u64>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: usize) -> ArcherResult<Vec<SearchUsage>>;
}

/// SQLite-backed usage log.
pub struct SqliteUsageStore {
    conn: Mutex<Connection>,
}

impl SqliteUsageStore {
    /// Create a new store at the given path
    pub fn new(path: impl AsRef<Path>) -> ArcherResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> ArcherResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> ArcherResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS search_usage (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                query TEXT NOT NULL,
                result_count INTEGER NOT NULL,
                estimated_cost REAL NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_usage_time ON search_usage(timestamp);
            CREATE INDEX IF NOT EXISTS idx_usage_user ON search_usage(user_id);
        "#,
        )?;
        Ok(())
    }

    fn row_to_usage(row: &rusqlite::Row<'_>) -> ArcherResult<SearchUsage> {
        let id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let query: String = row.get(2)?;
        let result_count: i64 = row.get(3)?;
        let estimated_cost: f64 = row.get(4)?;
        let timestamp: String = row.get(5)?;

        Ok(SearchUsage {
            id,
            user_id,
            query,
            result_count: result_count as usize,
            estimated_cost,
            timestamp: DateTime::parse_from_rfc3339(&timestamp)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ArcherError::parse(e.to_string()))?,
        })
    }
}

#[async_trait]
impl UsageStore for SqliteUsageStore {
    async fn append(&self, usage: &SearchUsage) -> ArcherResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"INSERT INTO search_usage (id, user_id, query, result_count, estimated_cost, timestamp)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                usage.id,
                usage.user_id,
                usage.query,
                usage.result_count as i64,
                usage.estimated_cost,
                usage.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn count_since(&self, since: DateTime<Utc>) -> ArcherResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM search_usage WHERE timestamp >= ?1",
            params![since.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn recent(&self, limit: usize) -> ArcherResult<Vec<SearchUsage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"SELECT id, user_id, query, result_count, estimated_cost, timestamp
               FROM search_usage
               ORDER BY timestamp DESC
               LIMIT ?1"#,
        )?;

        let results = stmt.query_map(params![limit as i64], |row| Ok(Self::row_to_usage(row)))?;
        results
            .map(|r| r.map_err(|e| e.into()).and_then(|inner| inner))
            .collect()
    }
}
