//! Retrieval pipeline type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw document text with the key identifying where it came from.
///
/// Produced by the document readers and discarded once chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Source key (file path, or `file.json#index` for JSON records)
    pub key: String,

    /// Raw text content
    pub text: String,
}

impl SourceDocument {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// A contiguous character window of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within the source (0-indexed)
    pub position: u32,

    /// Source document key
    pub source: String,

    /// Verbatim text content
    pub text: String,

    /// Character range `[start, end)` in the source text
    pub char_range: (usize, usize),
}

/// The persisted unit of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Sequential id assigned by the index
    pub id: u64,

    /// Chunk text
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Display form of the id, e.g. `chunk-12`.
    pub fn label(&self) -> String {
        entry_label(self.id)
    }
}

/// Render an entry id as `chunk-{id}`.
pub fn entry_label(id: u64) -> String {
    format!("chunk-{}", id)
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Entry id
    pub id: u64,

    /// Chunk text, verbatim
    pub text: String,

    /// Cosine similarity to the query
    pub score: f32,
}

/// Top-k hits ordered by descending score, ties by ascending id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievalHit>,
}

impl RetrievalResult {
    pub fn new(hits: Vec<RetrievalHit>) -> Self {
        Self { hits }
    }

    /// Chunk texts in ranked order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.hits.iter().map(|hit| hit.text.as_str())
    }

    /// Scores in ranked order.
    pub fn scores(&self) -> Vec<f32> {
        self.hits.iter().map(|hit| hit.score).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Score of the best hit, if any.
    pub fn top_score(&self) -> Option<f32> {
        self.hits.first().map(|hit| hit.score)
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Collection name
    pub collection: String,

    /// Number of source documents read
    pub documents_count: usize,

    /// Number of chunks produced
    pub chunks_count: usize,

    /// Number of entries appended to the collection
    pub entries_added: usize,

    /// True when the collection was already populated and nothing was done
    pub skipped: bool,

    /// Entry count after the run
    pub collection_count: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    /// Collection name
    pub name: String,

    /// Similarity metric (always "cosine")
    pub metric: String,

    /// Number of entries
    pub count: usize,

    /// Established embedding dimension, if any entries were ever added
    pub dimension: Option<usize>,

    /// Size of the backing file, for persistent indexes
    pub size_bytes: Option<u64>,

    /// When the last ingestion completed
    pub last_ingested_at: Option<DateTime<Utc>>,

    /// SHA-256 fingerprint of the corpus that was ingested
    pub fingerprint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_label() {
        assert_eq!(entry_label(0), "chunk-0");
        let entry = IndexEntry {
            id: 42,
            text: "x".to_string(),
            embedding: vec![1.0],
        };
        assert_eq!(entry.label(), "chunk-42");
    }

    #[test]
    fn test_retrieval_result_accessors() {
        let result = RetrievalResult::new(vec![
            RetrievalHit {
                id: 3,
                text: "inflation".to_string(),
                score: 0.9,
            },
            RetrievalHit {
                id: 1,
                text: "cedi".to_string(),
                score: 0.4,
            },
        ]);

        assert_eq!(result.len(), 2);
        assert_eq!(result.texts().collect::<Vec<_>>(), vec!["inflation", "cedi"]);
        assert_eq!(result.scores(), vec![0.9, 0.4]);
        assert_eq!(result.top_score(), Some(0.9));
        assert!(RetrievalResult::default().top_score().is_none());
    }

    #[test]
    fn test_ingest_report_serialization() {
        let report = IngestReport {
            collection: "ml_publications".to_string(),
            documents_count: 2,
            chunks_count: 5,
            entries_added: 5,
            skipped: false,
            collection_count: 5,
            duration_secs: 0.1,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entriesAdded"], 5);
        assert_eq!(json["skipped"], false);
    }
}
