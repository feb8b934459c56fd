//! Vector index abstraction for a single collection.
//!
//! Defines the storage trait plus the entry store and ranking shared by the
//! in-memory and SQLite backends.

use crate::types::{CollectionStats, IndexEntry, RetrievalHit, RetrievalResult};
use chrono::{DateTime, Utc};
use insight_core::{AppError, AppResult};
use std::cmp::Ordering;

/// The only similarity metric collections support.
pub const METRIC_COSINE: &str = "cosine";

/// Trait for vector index backends.
///
/// One instance holds one collection. Implementations must:
/// - assign fresh sequential ids on `add` and validate the whole batch
///   before writing anything
/// - rank `query` results by descending cosine similarity, ties by
///   ascending id
/// - allow concurrent `query` calls while `add` and `reset` are exclusive
pub trait VectorIndex: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Number of entries.
    fn count(&self) -> AppResult<usize>;

    /// Established dimension, `None` until the first successful add.
    fn dimension(&self) -> AppResult<Option<usize>>;

    /// Append `(text, embedding)` pairs, returning the new ids in order.
    fn add(&self, entries: &[(String, Vec<f32>)]) -> AppResult<Vec<u64>>;

    /// The `k` entries most similar to `embedding`.
    fn query(&self, embedding: &[f32], k: usize) -> AppResult<RetrievalResult>;

    /// Remove every entry and forget the dimension.
    fn reset(&self) -> AppResult<()>;

    /// Swap the whole collection for `entries` in one step.
    ///
    /// Ids restart at 0 and the dimension is taken from the new batch. A
    /// failure leaves the previous entries in place.
    fn replace_all(
        &self,
        entries: &[(String, Vec<f32>)],
        fingerprint: &str,
    ) -> AppResult<Vec<u64>>;

    /// Statistics about the collection.
    fn stats(&self) -> AppResult<CollectionStats>;

    /// Record the fingerprint of the corpus that was just ingested.
    fn record_ingestion(&self, fingerprint: &str) -> AppResult<()>;
}

/// Cosine similarity, 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a * norm_b);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Descending score, then ascending id.
fn rank_order(a: &RetrievalHit, b: &RetrievalHit) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// Entries plus collection metadata, guarded by a backend's lock.
#[derive(Debug, Default, Clone)]
pub(crate) struct EntryStore {
    pub(crate) entries: Vec<IndexEntry>,
    pub(crate) dimension: Option<usize>,
    pub(crate) fingerprint: Option<String>,
    pub(crate) last_ingested_at: Option<DateTime<Utc>>,
}

impl EntryStore {
    /// Id the next appended entry receives.
    pub(crate) fn next_id(&self) -> u64 {
        self.entries.last().map(|e| e.id + 1).unwrap_or(0)
    }

    /// Dimension the batch would establish, or the mismatch it contains.
    ///
    /// Empty batches return the current dimension.
    pub(crate) fn validate_batch(
        &self,
        batch: &[(String, Vec<f32>)],
    ) -> AppResult<Option<usize>> {
        let Some((_, first)) = batch.first() else {
            return Ok(self.dimension);
        };

        let expected = self.dimension.unwrap_or(first.len());
        if expected == 0 {
            return Err(AppError::Storage(
                "Cannot add zero-length embeddings".to_string(),
            ));
        }

        for (_, embedding) in batch {
            if embedding.len() != expected {
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        Ok(Some(expected))
    }

    /// Build entries for a validated batch without storing them.
    pub(crate) fn prepare(&self, batch: &[(String, Vec<f32>)]) -> Vec<IndexEntry> {
        let first_id = self.next_id();
        batch
            .iter()
            .enumerate()
            .map(|(i, (text, embedding))| IndexEntry {
                id: first_id + i as u64,
                text: text.clone(),
                embedding: embedding.clone(),
            })
            .collect()
    }

    pub(crate) fn append(&mut self, entries: Vec<IndexEntry>, dimension: Option<usize>) {
        self.entries.extend(entries);
        self.dimension = dimension;
    }

    pub(crate) fn clear(&mut self) {
        *self = EntryStore::default();
    }

    /// Fresh store holding only `batch`, validated as if the collection
    /// were empty.
    pub(crate) fn rebuilt(
        batch: &[(String, Vec<f32>)],
        fingerprint: &str,
        ingested_at: DateTime<Utc>,
    ) -> AppResult<EntryStore> {
        let mut store = EntryStore::default();
        let dimension = store.validate_batch(batch)?;
        let entries = store.prepare(batch);
        store.append(entries, dimension);
        store.fingerprint = Some(fingerprint.to_string());
        store.last_ingested_at = Some(ingested_at);
        Ok(store)
    }

    /// Exact linear scan over every entry.
    pub(crate) fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> AppResult<RetrievalResult> {
        if self.entries.is_empty() {
            return Err(AppError::EmptyCollection(collection.to_string()));
        }

        if let Some(expected) = self.dimension {
            if embedding.len() != expected {
                return Err(AppError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        if k == 0 {
            return Ok(RetrievalResult::default());
        }

        let mut hits: Vec<RetrievalHit> = self
            .entries
            .iter()
            .map(|entry| RetrievalHit {
                id: entry.id,
                text: entry.text.clone(),
                score: cosine_similarity(embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(rank_order);
        hits.truncate(k);

        tracing::debug!(
            "Ranked {} entries in '{}', returning {}",
            self.entries.len(),
            collection,
            hits.len()
        );

        Ok(RetrievalResult::new(hits))
    }

    pub(crate) fn stats(&self, name: &str, size_bytes: Option<u64>) -> CollectionStats {
        CollectionStats {
            name: name.to_string(),
            metric: METRIC_COSINE.to_string(),
            count: self.entries.len(),
            dimension: self.dimension,
            size_bytes,
            last_ingested_at: self.last_ingested_at,
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// Map a poisoned lock into a storage error.
pub(crate) fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Storage("Index lock poisoned".to_string())
}
