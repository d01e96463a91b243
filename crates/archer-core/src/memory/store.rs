//! Fact storage trait and the SQLite implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{ArcherError, ArcherResult};
use crate::types::{MemoryFact, UserMemory};

/// Trait for per-user fact storage.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Load a user's full memory. Users that never stored anything get an
    /// empty collection; nothing is written until the first fact arrives.
    async fn get(&self, user_id: &str) -> ArcherResult<UserMemory>;

    /// Insert or replace a fact.
    ///
    /// Auto-extracted facts whose content hash already exists for the user
    /// are skipped; returns whether the fact was actually stored.
    async fn put_fact(&self, user_id: &str, fact: &MemoryFact) -> ArcherResult<bool>;

    /// Delete one fact. Returns whether it existed.
    async fn delete(&self, user_id: &str, fact_id: &str) -> ArcherResult<bool>;

    /// Delete every fact for a user. Returns the number removed.
    async fn clear(&self, user_id: &str) -> ArcherResult<usize>;

    /// Bump `use_count`/`last_used_at` on the listed facts.
    async fn record_use(&self, user_id: &str, fact_ids: &[String]) -> ArcherResult<()>;

    /// Delete expired facts for a user and stamp `last_cleanup`. Returns the
    /// number removed; a repeat run removes nothing.
    async fn sweep_expired(&self, user_id: &str) -> ArcherResult<usize>;
}

/// SQLite-backed fact store.
pub struct SqliteFactStore {
    conn: Mutex<Connection>,
}

impl SqliteFactStore {
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
            CREATE TABLE IF NOT EXISTS facts (
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                tier TEXT NOT NULL,
                confidence REAL NOT NULL,
                created_at TEXT NOT NULL,
                last_used_at TEXT NOT NULL,
                use_count INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT,
                auto_extracted INTEGER NOT NULL DEFAULT 0,
                keywords TEXT NOT NULL,
                source TEXT NOT NULL,
                hash TEXT,
                PRIMARY KEY (user_id, id)
            );

            CREATE INDEX IF NOT EXISTS idx_facts_user ON facts(user_id);
            CREATE INDEX IF NOT EXISTS idx_facts_expires ON facts(expires_at);
            CREATE INDEX IF NOT EXISTS idx_facts_hash ON facts(user_id, hash);

            CREATE TABLE IF NOT EXISTS user_memory (
                user_id TEXT PRIMARY KEY,
                last_cleanup TEXT,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn parse_datetime(s: &str) -> ArcherResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ArcherError::parse(e.to_string()))
    }

    fn row_to_fact(row: &rusqlite::Row<'_>) -> ArcherResult<MemoryFact> {
        let id: String = row.get(0)?;
        let content: String = row.get(1)?;
        let category: String = row.get(2)?;
        let tier: String = row.get(3)?;
        let confidence: f64 = row.get(4)?;
        let created_at: String = row.get(5)?;
        let last_used_at: String = row.get(6)?;
        let use_count: u32 = row.get(7)?;
        let expires_at: Option<String> = row.get(8)?;
        let auto_extracted: i32 = row.get(9)?;
        let keywords: String = row.get(10)?;
        let source: String = row.get(11)?;
        let hash: Option<String> = row.get(12)?;

        Ok(MemoryFact {
            id,
            content,
            category: category
                .parse()
                .map_err(|_| ArcherError::parse(format!("unknown fact category: {category}")))?,
            tier: tier
                .parse()
                .map_err(|_| ArcherError::parse(format!("unknown memory tier: {tier}")))?,
            confidence,
            created_at: Self::parse_datetime(&created_at)?,
            last_used_at: Self::parse_datetime(&last_used_at)?,
            use_count,
            expires_at: expires_at.map(|s| Self::parse_datetime(&s)).transpose()?,
            auto_extracted: auto_extracted != 0,
            keywords: serde_json::from_str(&keywords)?,
            source,
            hash,
        })
    }

    fn touch_user(conn: &Connection, user_id: &str, now: &str) -> ArcherResult<()> {
        conn.execute(
            r#"INSERT INTO user_memory (user_id, last_cleanup, updated_at)
               VALUES (?1, NULL, ?2)
               ON CONFLICT(user_id) DO UPDATE SET updated_at = ?2"#,
            params![user_id, now],
        )?;
        Ok(())
    }
}

#[async_trait]
impl FactStore for SqliteFactStore {
    async fn get(&self, user_id: &str) -> ArcherResult<UserMemory> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"SELECT id, content, category, tier, confidence, created_at, last_used_at,
                      use_count, expires_at, auto_extracted, keywords, source, hash
               FROM facts WHERE user_id = ?1
               ORDER BY created_at"#,
        )?;

        let results = stmt.query_map(params![user_id], |row| Ok(Self::row_to_fact(row)))?;
        let facts: Vec<MemoryFact> = results
            .map(|r| r.map_err(|e| e.into()).and_then(|inner| inner))
            .collect::<ArcherResult<_>>()?;

        let meta: Option<(Option<String>, String)> = conn
            .query_row(
                "SELECT last_cleanup, updated_at FROM user_memory WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let mut memory = UserMemory::new(user_id);
        memory.facts = facts;
        memory.recount();
        if let Some((last_cleanup, updated_at)) = meta {
            memory.stats.last_cleanup = last_cleanup
                .map(|s| Self::parse_datetime(&s))
                .transpose()?;
            memory.updated_at = Self::parse_datetime(&updated_at)?;
        }
        Ok(memory)
    }

    async fn put_fact(&self, user_id: &str, fact: &MemoryFact) -> ArcherResult<bool> {
        let conn = self.conn.lock().unwrap();

        if fact.auto_extracted {
            if let Some(hash) = &fact.hash {
                let duplicate: Option<String> = conn
                    .query_row(
                        "SELECT id FROM facts WHERE user_id = ?1 AND hash = ?2 AND id != ?3 LIMIT 1",
                        params![user_id, hash, fact.id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(existing) = duplicate {
                    debug!(user_id, existing, "skipping duplicate auto-extracted fact");
                    return Ok(false);
                }
            }
        }

        conn.execute(
            r#"INSERT OR REPLACE INTO facts
               (user_id, id, content, category, tier, confidence, created_at, last_used_at,
                use_count, expires_at, auto_extracted, keywords, source, hash)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"#,
            params![
                user_id,
                fact.id,
                fact.content,
                fact.category.to_string(),
                fact.tier.to_string(),
                fact.confidence,
                fact.created_at.to_rfc3339(),
                fact.last_used_at.to_rfc3339(),
                fact.use_count,
                fact.expires_at.map(|dt| dt.to_rfc3339()),
                fact.auto_extracted as i32,
                serde_json::to_string(&fact.keywords)?,
                fact.source,
                fact.hash,
            ],
        )?;
        Self::touch_user(&conn, user_id, &Utc::now().to_rfc3339())?;
        Ok(true)
    }

    async fn delete(&self, user_id: &str, fact_id: &str) -> ArcherResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "DELETE FROM facts WHERE user_id = ?1 AND id = ?2",
            params![user_id, fact_id],
        )?;
        if count > 0 {
            Self::touch_user(&conn, user_id, &Utc::now().to_rfc3339())?;
        }
        Ok(count > 0)
    }

    async fn clear(&self, user_id: &str) -> ArcherResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute("DELETE FROM facts WHERE user_id = ?1", params![user_id])?;
        Self::touch_user(&conn, user_id, &Utc::now().to_rfc3339())?;
        Ok(count)
    }

    async fn record_use(&self, user_id: &str, fact_ids: &[String]) -> ArcherResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        for fact_id in fact_ids {
            conn.execute(
                r#"UPDATE facts SET use_count = use_count + 1, last_used_at = ?3
                   WHERE user_id = ?1 AND id = ?2"#,
                params![user_id, fact_id, now],
            )?;
        }
        Ok(())
    }

    async fn sweep_expired(&self, user_id: &str) -> ArcherResult<usize> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let count = conn.execute(
            r#"DELETE FROM facts
               WHERE user_id = ?1 AND expires_at IS NOT NULL AND expires_at <= ?2"#,
            params![user_id, now],
        )?;
        conn.execute(
            r#"INSERT INTO user_memory (user_id, last_cleanup, updated_at)
               VALUES (?1, ?2, ?2)
               ON CONFLICT(user_id) DO UPDATE SET last_cleanup = ?2"#,
            params![user_id, now],
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FactCategory, MemoryTier};
    use chrono::Duration;

    fn fact(content: &str, tier: MemoryTier) -> MemoryFact {
        MemoryFact::new(content, FactCategory::Preference, tier)
    }

    #[tokio::test]
    async fn test_fact_store_crud() {
        let store = SqliteFactStore::in_memory().unwrap();

        let f = fact("likes dark mode", MemoryTier::Core)
            .with_keywords(vec!["dark mode".to_string()])
            .with_source("settings page");
        let id = f.id.clone();
        assert!(store.put_fact("user1", &f).await.unwrap());

        let memory = store.get("user1").await.unwrap();
        assert_eq!(memory.facts.len(), 1);
        assert_eq!(memory.facts[0], f);
        assert_eq!(memory.stats.total_facts, 1);

        assert!(store.delete("user1", &id).await.unwrap());
        assert!(!store.delete("user1", &id).await.unwrap());
        assert!(store.get("user1").await.unwrap().facts.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_gets_empty_memory() {
        let store = SqliteFactStore::in_memory().unwrap();
        let memory = store.get("nobody").await.unwrap();
        assert_eq!(memory.user_id, "nobody");
        assert!(memory.facts.is_empty());
        assert_eq!(memory.stats.total_facts, 0);
        assert!(memory.stats.last_cleanup.is_none());
    }

    #[tokio::test]
    async fn test_put_fact_replaces_by_id() {
        let store = SqliteFactStore::in_memory().unwrap();
        let mut f = fact("likes tea", MemoryTier::Core);
        store.put_fact("user1", &f).await.unwrap();

        f.content = "likes oolong tea".to_string();
        store.put_fact("user1", &f).await.unwrap();

        let memory = store.get("user1").await.unwrap();
        assert_eq!(memory.facts.len(), 1);
        assert_eq!(memory.facts[0].content, "likes oolong tea");
    }

    #[tokio::test]
    async fn test_auto_extracted_duplicates_skipped() {
        let store = SqliteFactStore::in_memory().unwrap();

        let first = fact("has a cat named Miso", MemoryTier::Important).with_auto_extracted(true);
        let second = fact("has a cat named Miso", MemoryTier::Important).with_auto_extracted(true);
        assert!(store.put_fact("user1", &first).await.unwrap());
        assert!(!store.put_fact("user1", &second).await.unwrap());
        assert_eq!(store.get("user1").await.unwrap().facts.len(), 1);

        // Explicit user statements are never deduplicated.
        let manual = fact("has a cat named Miso", MemoryTier::Important);
        assert!(store.put_fact("user1", &manual).await.unwrap());
        assert_eq!(store.get("user1").await.unwrap().facts.len(), 2);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = SqliteFactStore::in_memory().unwrap();
        store
            .put_fact("user1", &fact("a", MemoryTier::Core))
            .await
            .unwrap();
        store
            .put_fact("user2", &fact("b", MemoryTier::Core))
            .await
            .unwrap();

        assert_eq!(store.get("user1").await.unwrap().facts[0].content, "a");
        assert_eq!(store.get("user2").await.unwrap().facts[0].content, "b");
        assert_eq!(store.clear("user1").await.unwrap(), 1);
        assert_eq!(store.get("user2").await.unwrap().facts.len(), 1);
    }

    #[tokio::test]
    async fn test_record_use_persists() {
        let store = SqliteFactStore::in_memory().unwrap();
        let f = fact("plays piano", MemoryTier::Core);
        let id = f.id.clone();
        store.put_fact("user1", &f).await.unwrap();

        store
            .record_use("user1", &[id.clone()])
            .await
            .unwrap();
        store.record_use("user1", &[id.clone()]).await.unwrap();

        let memory = store.get("user1").await.unwrap();
        assert_eq!(memory.facts[0].use_count, 2);
        assert!(memory.facts[0].last_used_at > memory.facts[0].created_at);
    }

    #[tokio::test]
    async fn test_sweep_expired_removes_and_stamps() {
        let store = SqliteFactStore::in_memory().unwrap();

        store
            .put_fact("user1", &fact("permanent", MemoryTier::Core))
            .await
            .unwrap();
        let mut stale = fact("old chatter", MemoryTier::Context);
        stale.expires_at = Some(Utc::now() - Duration::days(1));
        store.put_fact("user1", &stale).await.unwrap();

        assert_eq!(store.sweep_expired("user1").await.unwrap(), 1);
        assert_eq!(store.sweep_expired("user1").await.unwrap(), 0);

        let memory = store.get("user1").await.unwrap();
        assert_eq!(memory.facts.len(), 1);
        assert_eq!(memory.facts[0].content, "permanent");
        assert!(memory.stats.last_cleanup.is_some());
    }

    #[tokio::test]
    async fn test_fields_roundtrip_through_sql() {
        let store = SqliteFactStore::in_memory().unwrap();
        let f = fact("speaks mandarin", MemoryTier::Important)
            .with_confidence(0.75)
            .with_keywords(vec!["mandarin".to_string(), "语言".to_string()])
            .with_source("conversation 42")
            .with_auto_extracted(true);
        store.put_fact("user1", &f).await.unwrap();

        let loaded = &store.get("user1").await.unwrap().facts[0];
        assert_eq!(loaded.category, FactCategory::Preference);
        assert_eq!(loaded.tier, MemoryTier::Important);
        assert_eq!(loaded.confidence, 0.75);
        assert_eq!(loaded.keywords, vec!["mandarin", "语言"]);
        assert_eq!(loaded.expires_at, f.expires_at);
        assert!(loaded.auto_extracted);
        assert_eq!(loaded.hash, f.hash);
    }
}
