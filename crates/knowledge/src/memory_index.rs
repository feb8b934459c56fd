//! In-memory vector index.

use crate::types::{CollectionStats, RetrievalResult};
use crate::vector_index::{poisoned, EntryStore, VectorIndex};
use chrono::Utc;
use insight_core::AppResult;
use std::sync::RwLock;

/// Volatile collection held in process memory.
///
/// Readers share the lock; `add` and `reset` take it exclusively.
#[derive(Debug)]
pub struct MemoryIndex {
    name: String,
    store: RwLock<EntryStore>,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: RwLock::new(EntryStore::default()),
        }
    }
}

impl VectorIndex for MemoryIndex {
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
        let prepared = store.prepare(entries);
        let ids = prepared.iter().map(|e| e.id).collect();
        store.append(prepared, dimension);
        Ok(ids)
    }

    fn query(&self, embedding: &[f32], k: usize) -> AppResult<RetrievalResult> {
        self.store
            .read()
            .map_err(poisoned)?
            .query(&self.name, embedding, k)
    }

    fn reset(&self) -> AppResult<()> {
        self.store.write().map_err(poisoned)?.clear();
        tracing::debug!("Reset in-memory collection '{}'", self.name);
        Ok(())
    }

    fn replace_all(
        &self,
        entries: &[(String, Vec<f32>)],
        fingerprint: &str,
    ) -> AppResult<Vec<u64>> {
        let mut store = self.store.write().map_err(poisoned)?;
        let rebuilt = EntryStore::rebuilt(entries, fingerprint, Utc::now())?;
        let ids = rebuilt.entries.iter().map(|e| e.id).collect();
        *store = rebuilt;
        Ok(ids)
    }

    fn stats(&self) -> AppResult<CollectionStats> {
        Ok(self.store.read().map_err(poisoned)?.stats(&self.name, None))
    }

    fn record_ingestion(&self, fingerprint: &str) -> AppResult<()> {
        let mut store = self.store.write().map_err(poisoned)?;
        store.fingerprint = Some(fingerprint.to_string());
        store.last_ingested_at = Some(Utc::now());
        Ok(())
    }
}
