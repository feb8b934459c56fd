//! SQLite-backed vector index.
//!
//! The database file is the durable copy; every entry is also held in an
//! in-memory cache loaded at open, so queries never touch SQLite.

use crate::types::{CollectionStats, IndexEntry, RetrievalResult};
use crate::vector_index::{poisoned, EntryStore, VectorIndex, METRIC_COSINE};
use chrono::{DateTime, Utc};
use insight_core::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Persistent collection stored in a SQLite database file.
///
/// Lock order is always cache, then connection.
#[derive(Debug)]
pub struct SqliteIndex {
    name: String,
    path: PathBuf,
    conn: Mutex<Connection>,
    store: RwLock<EntryStore>,
}

impl SqliteIndex {
    /// Open (or create) the collection `name` in the database at `db_path`.
    pub fn open(db_path: &Path, name: &str) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open SQLite index: {}", e)))?;

        init_schema(&conn)?;

        conn.execute(
            "INSERT OR IGNORE INTO collections (name, metric) VALUES (?1, ?2)",
            params![name, METRIC_COSINE],
        )
        .map_err(|e| AppError::Storage(format!("Failed to register collection: {}", e)))?;

        let store = load_store(&conn, name)?;

        tracing::debug!(
            "Opened collection '{}' at {:?} ({} entries)",
            name,
            db_path,
            store.entries.len()
        );

        Ok(Self {
            name: name.to_string(),
            path: db_path.to_path_buf(),
            conn: Mutex::new(conn),
            store: RwLock::new(store),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            name TEXT PRIMARY KEY,
            metric TEXT NOT NULL,
            dimension INTEGER,
            fingerprint TEXT,
            last_ingested_at TEXT
        );

        CREATE TABLE IF NOT EXISTS entries (
            collection TEXT NOT NULL,
            id INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            PRIMARY KEY (collection, id),
            FOREIGN KEY (collection) REFERENCES collections(name)
        );
        "#,
    )
    .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))
}

fn load_store(conn: &Connection, name: &str) -> AppResult<EntryStore> {
    let (metric, dimension, fingerprint, last_ingested_at) = conn
        .query_row(
            "SELECT metric, dimension, fingerprint, last_ingested_at FROM collections WHERE name = ?1",
            params![name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()
        .map_err(|e| AppError::Storage(format!("Failed to read collection: {}", e)))?
        .ok_or_else(|| AppError::Storage(format!("Collection '{}' is not registered", name)))?;

    if metric != METRIC_COSINE {
        return Err(AppError::Storage(format!(
            "Collection '{}' uses unsupported metric '{}'",
            name, metric
        )));
    }

    let last_ingested_at = match last_ingested_at {
        Some(ts) => Some(
            DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| AppError::Storage(format!("Invalid ingestion timestamp: {}", e)))?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    let mut stmt = conn
        .prepare("SELECT id, text, embedding FROM entries WHERE collection = ?1 ORDER BY id")
        .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

    let entries = stmt
        .query_map(params![name], |row| {
            let bytes: Vec<u8> = row.get(2)?;
            let embedding = bytes_to_embedding(&bytes).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Blob, Box::new(e))
            })?;
            Ok(IndexEntry {
                id: row.get::<_, i64>(0)? as u64,
                text: row.get(1)?,
                embedding,
            })
        })
        .map_err(|e| AppError::Storage(format!("Failed to query entries: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Storage(format!("Failed to load entries: {}", e)))?;

    Ok(EntryStore {
        entries,
        dimension: dimension.map(|d| d as usize),
        fingerprint,
        last_ingested_at,
    })
}

impl VectorIndex for SqliteIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self) -> AppResult<usize> {
        Ok(self.store.read().map_err(poisoned)?.entries.len())
    }

    fn dimension(&self) -> AppResult<Option<usize>> {
        Ok(self.store.read().map_err(poisoned)?.dimension)
    }

    fn add(&self, entries: &[(String, Vec<f32>)]) -> AppResult<Vec<u64>> {
        let mut store = self.store.write().map_err(poisoned)?;
        let dimension = store.validate_batch(entries)?;
        if entries.is_empty() {
            return Ok(vec![]);
        }

        let prepared = store.prepare(entries);

        {
            let mut conn = self.conn.lock().map_err(poisoned)?;
            let tx = conn
                .transaction()
                .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

            insert_entries(&tx, &self.name, &prepared)?;

            tx.execute(
                "UPDATE collections SET dimension = ?1 WHERE name = ?2",
                params![dimension.map(|d| d as i64), self.name],
            )
            .map_err(|e| AppError::Storage(format!("Failed to update collection: {}", e)))?;

            tx.commit()
                .map_err(|e| AppError::Storage(format!("Failed to commit entries: {}", e)))?;
        }

        let ids: Vec<u64> = prepared.iter().map(|e| e.id).collect();
        store.append(prepared, dimension);

        tracing::debug!("Added {} entries to '{}'", ids.len(), self.name);
        Ok(ids)
    }

    fn query(&self, embedding: &[f32], k: usize) -> AppResult<RetrievalResult> {
        self.store
            .read()
            .map_err(poisoned)?
            .query(&self.name, embedding, k)
    }

    fn reset(&self) -> AppResult<()> {
        let mut store = self.store.write().map_err(poisoned)?;
        let mut conn = self.conn.lock().map_err(poisoned)?;

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;
        tx.execute("DELETE FROM entries WHERE collection = ?1", params![self.name])
            .map_err(|e| AppError::Storage(format!("Failed to delete entries: {}", e)))?;
        tx.execute(
            "UPDATE collections SET dimension = NULL, fingerprint = NULL, last_ingested_at = NULL WHERE name = ?1",
            params![self.name],
        )
        .map_err(|e| AppError::Storage(format!("Failed to reset collection: {}", e)))?;
        tx.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit reset: {}", e)))?;

        store.clear();

        tracing::info!("Reset collection '{}'", self.name);
        Ok(())
    }

    fn replace_all(
        &self,
        entries: &[(String, Vec<f32>)],
        fingerprint: &str,
    ) -> AppResult<Vec<u64>> {
        let mut store = self.store.write().map_err(poisoned)?;
        let rebuilt = EntryStore::rebuilt(entries, fingerprint, Utc::now())?;

        {
            let mut conn = self.conn.lock().map_err(poisoned)?;
            let tx = conn
                .transaction()
                .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

            tx.execute("DELETE FROM entries WHERE collection = ?1", params![self.name])
                .map_err(|e| AppError::Storage(format!("Failed to delete entries: {}", e)))?;
            insert_entries(&tx, &self.name, &rebuilt.entries)?;
            tx.execute(
                "UPDATE collections SET dimension = ?1, fingerprint = ?2, last_ingested_at = ?3 WHERE name = ?4",
                params![
                    rebuilt.dimension.map(|d| d as i64),
                    fingerprint,
                    rebuilt.last_ingested_at.map(|t| t.to_rfc3339()),
                    self.name
                ],
            )
            .map_err(|e| AppError::Storage(format!("Failed to update collection: {}", e)))?;

            tx.commit()
                .map_err(|e| AppError::Storage(format!("Failed to commit rebuild: {}", e)))?;
        }

        let ids: Vec<u64> = rebuilt.entries.iter().map(|e| e.id).collect();
        *store = rebuilt;

        tracing::info!("Rebuilt collection '{}' with {} entries", self.name, ids.len());
        Ok(ids)
    }

    fn stats(&self) -> AppResult<CollectionStats> {
        let size_bytes = std::fs::metadata(&self.path).map(|m| m.len()).ok();
        Ok(self
            .store
            .read()
            .map_err(poisoned)?
            .stats(&self.name, size_bytes))
    }

    fn record_ingestion(&self, fingerprint: &str) -> AppResult<()> {
        let mut store = self.store.write().map_err(poisoned)?;
        let now = Utc::now();

        self.conn
            .lock()
            .map_err(poisoned)?
            .execute(
                "UPDATE collections SET fingerprint = ?1, last_ingested_at = ?2 WHERE name = ?3",
                params![fingerprint, now.to_rfc3339(), self.name],
            )
            .map_err(|e| AppError::Storage(format!("Failed to record ingestion: {}", e)))?;

        store.fingerprint = Some(fingerprint.to_string());
        store.last_ingested_at = Some(now);
        Ok(())
    }
}

fn insert_entries(
    tx: &Transaction<'_>,
    collection: &str,
    entries: &[IndexEntry],
) -> AppResult<()> {
    let mut insert = tx
        .prepare("INSERT INTO entries (collection, id, text, embedding) VALUES (?1, ?2, ?3, ?4)")
        .map_err(|e| AppError::Storage(format!("Failed to prepare insert: {}", e)))?;

    for entry in entries {
        insert
            .execute(params![
                collection,
                entry.id as i64,
                entry.text,
                embedding_to_bytes(&entry.embedding),
            ])
            .map_err(|e| AppError::Storage(format!("Failed to insert entry: {}", e)))?;
    }

    Ok(())
}

/// Little-endian f32 encoding.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Storage(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
