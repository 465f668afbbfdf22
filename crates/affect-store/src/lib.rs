//! affect-store — SQLite persistence for prediction records.
//!
//! One flat table, append-only: a record is written exactly once per
//! successful prediction and never updated or deleted. The schema is
//! created on open if absent.

use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tokio_rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS predictions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    image_filename TEXT NOT NULL,
    emotion        TEXT NOT NULL,
    created_at     TEXT NOT NULL
)";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] tokio_rusqlite::Error),
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// One persisted prediction event.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub name: String,
    pub image_filename: String,
    pub emotion: String,
    /// RFC 3339 UTC timestamp taken at insert time.
    pub created_at: String,
}

/// Handle to the predictions table.
///
/// Cheap to clone; all calls go through one background connection.
#[derive(Clone)]
pub struct PredictionStore {
    conn: Connection,
}

impl PredictionStore {
    /// Open (creating if needed) the database file and ensure the schema.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).await?;
        Self::init(conn).await
    }

    /// In-memory store, used by tests and throwaway runs.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute(SCHEMA, [])?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// Append one record and return it with its assigned id.
    ///
    /// Single insert-and-commit, synchronous with the caller; a failure
    /// propagates as-is with no retry.
    pub async fn insert(
        &self,
        name: &str,
        image_filename: &str,
        emotion: &str,
    ) -> Result<PredictionRecord, StoreError> {
        let record = PredictionRecord {
            id: 0,
            name: name.to_string(),
            image_filename: image_filename.to_string(),
            emotion: emotion.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        let mut stored = record.clone();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO predictions (name, image_filename, emotion, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        record.name,
                        record.image_filename,
                        record.emotion,
                        record.created_at
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        stored.id = id;
        tracing::debug!(id, emotion = %stored.emotion, "prediction record inserted");
        Ok(stored)
    }

    /// Newest records first, up to `limit`.
    pub async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>, StoreError> {
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, image_filename, emotion, created_at
                     FROM predictions ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map([limit as i64], |row| {
                        Ok(PredictionRecord {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            image_filename: row.get(2)?,
                            emotion: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(records)
    }

    /// Total number of stored records.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .call(|conn| {
                let n: i64 =
                    conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
                Ok(n)
            })
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = PredictionStore::in_memory().await.unwrap();

        let a = store.insert("Alice", "ab12_face.png", "Happy").await.unwrap();
        let b = store.insert("Bob", "cd34_face.png", "Sad").await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(a.name, "Alice");
        assert_eq!(a.image_filename, "ab12_face.png");
        assert_eq!(a.emotion, "Happy");
        assert!(!a.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_recent_returns_newest_first() {
        let store = PredictionStore::in_memory().await.unwrap();
        for (name, emotion) in [("a", "Angry"), ("b", "Fear"), ("c", "Neutral")] {
            store.insert(name, "f.png", emotion).await.unwrap();
        }

        let records = store.recent(2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "c");
        assert_eq!(records[1].name, "b");
    }

    #[tokio::test]
    async fn test_count() {
        let store = PredictionStore::in_memory().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        store.insert("x", "f.png", "Surprise").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let root = std::env::temp_dir().join(format!("affect-store-test-{}", std::process::id()));
        let db_path = root.join("nested").join("affect.db");

        let store = PredictionStore::open(&db_path).await.unwrap();
        store.insert("x", "f.png", "Disgust").await.unwrap();
        assert!(db_path.exists());

        // Reopen and read back through a fresh connection.
        let reopened = PredictionStore::open(&db_path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);

        let _ = std::fs::remove_dir_all(&root);
    }
}
