//! Character-trigram hashing embedder for local, offline operation.

use crate::embeddings::Embedder;
use insight_core::{AppError, AppResult};
use std::collections::HashMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "did", "does",
];

/// Deterministic embedder built from word and character-trigram hashes.
///
/// Not semantic in the neural sense, but texts that share vocabulary land
/// close together, which is enough for development, tests and small
/// single-publication corpora. Output vectors are unit length, or all zero
/// for text without indexable words.
#[derive(Debug, Clone)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let weight = (*freq as f32).sqrt();

            // Pad so prefixes and suffixes get their own trigrams.
            let padded: Vec<char> = std::iter::once('#')
                .chain(word.chars())
                .chain(std::iter::once('#'))
                .collect();
            for gram in padded.windows(3) {
                let idx = self.bucket(gram.iter().copied(), 37);
                embedding[idx] += weight;
            }

            let idx = self.bucket(word.chars(), 31);
            embedding[idx] += 2.0 * weight;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }

    fn bucket(&self, chars: impl Iterator<Item = char>, multiplier: u64) -> usize {
        let hash = chars.fold(0u64, |acc, c| {
            acc.wrapping_mul(multiplier).wrapping_add(c as u64)
        });
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl Embedder for TrigramEmbedder {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_documents(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::cosine_similarity;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_embed_query_unit_length() {
        let embedder = TrigramEmbedder::new(384).unwrap();
        let embedding = embedder.embed_query("Ghana inflation").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_embed_documents_batch() {
        let embedder = TrigramEmbedder::new(128).unwrap();
        let texts = vec![
            "policy rate".to_string(),
            "treasury bills".to_string(),
            "cocoa exports".to_string(),
        ];

        let embeddings = embedder.embed_documents(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 128));
    }

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = TrigramEmbedder::new(384).unwrap();
        let a = embedder.embed_query("deterministic test").await.unwrap();
        let b = embedder.embed_query("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = TrigramEmbedder::new(384).unwrap();
        let query = embedder
            .embed_query("What is Ghana's inflation rate?")
            .await
            .unwrap();
        let related = embedder
            .embed_query("Ghana's inflation rate fell to 18% in May 2025.")
            .await
            .unwrap();
        let unrelated = embedder
            .embed_query("Cocoa farmers harvested beans early")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_zero_vector() {
        let embedder = TrigramEmbedder::new(384).unwrap();
        let embedding = embedder.embed_query("").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(TrigramEmbedder::new(0), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_utf8_text() {
        let embedder = TrigramEmbedder::new(384).unwrap();
        let embedding = embedder
            .embed_query("Le cédi ghanéen 🎮 s'est apprécié")
            .await
            .unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
