//! Text chunking with configurable size and overlap.
//!
//! Positions are counted in characters, never bytes, so a chunk boundary
//! never lands inside a UTF-8 sequence.

use crate::types::{Chunk, SourceDocument};
use insight_core::{AppError, AppResult, KnowledgeConfig};

/// Boundaries tried from strongest to weakest.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// Validated chunk size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    size: usize,
    overlap: usize,
}

impl ChunkParams {
    /// Validate `0 < overlap < size`.
    pub fn new(size: usize, overlap: usize) -> AppResult<Self> {
        if size == 0 {
            return Err(AppError::MalformedChunkParameters(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap == 0 || overlap >= size {
            return Err(AppError::MalformedChunkParameters(format!(
                "chunk_overlap must satisfy 0 < overlap < chunk_size (got overlap {}, size {})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn from_config(config: &KnowledgeConfig) -> AppResult<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// Chunk text into overlapping segments.
///
/// Each window prefers the latest paragraph, line, sentence or word break
/// that still leaves the cursor moving forward; otherwise it is cut hard at
/// `size` characters. The next window starts `overlap` characters before the
/// previous end, so consecutive chunks always share exactly `overlap`
/// characters. Chunks are verbatim and whitespace-only windows are dropped.
pub fn split(source: &str, text: &str, params: ChunkParams) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return vec![];
    }

    // Byte offset of every char, plus the end of the string.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = offsets.len() - 1;

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0usize;

    loop {
        let window_end = (start + params.size).min(total);
        let end = if window_end == total {
            total
        } else {
            find_boundary(text, &offsets, start, window_end, params).unwrap_or(window_end)
        };

        let piece = &text[offsets[start]..offsets[end]];
        if !piece.trim().is_empty() {
            chunks.push(Chunk {
                position,
                source: source.to_string(),
                text: piece.to_string(),
                char_range: (start, end),
            });
            position += 1;
        }

        if end == total {
            break;
        }
        start = end - params.overlap;
    }

    tracing::debug!(
        "Chunked '{}' into {} chunks (size: {}, overlap: {})",
        source,
        chunks.len(),
        params.size,
        params.overlap
    );

    chunks
}

/// Latest acceptable break in `[start, window_end)`, as a char index just
/// past the separator.
///
/// A break must close at least half a window and lie strictly after
/// `start + overlap`, otherwise the cursor would stall or the chunks would
/// degenerate into slivers.
fn find_boundary(
    text: &str,
    offsets: &[usize],
    start: usize,
    window_end: usize,
    params: ChunkParams,
) -> Option<usize> {
    let min_end = start + (params.overlap + 1).max(params.size / 2);
    let window = &text[offsets[start]..offsets[window_end]];

    for separator in SEPARATORS {
        if let Some(byte_pos) = window.rfind(separator) {
            let absolute = offsets[start] + byte_pos + separator.len();
            // Separators are ASCII, so `absolute` is always a char boundary.
            if let Ok(end) = offsets.binary_search(&absolute) {
                if end >= min_end {
                    return Some(end);
                }
            }
        }
    }

    None
}

/// Chunk every document in order.
pub fn split_documents(documents: &[SourceDocument], params: ChunkParams) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| split(&doc.key, &doc.text, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(size: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(size, overlap).unwrap()
    }

    #[test]
    fn test_params_validation() {
        assert!(ChunkParams::new(500, 50).is_ok());
        assert!(matches!(
            ChunkParams::new(0, 0),
            Err(AppError::MalformedChunkParameters(_))
        ));
        assert!(matches!(
            ChunkParams::new(100, 100),
            Err(AppError::MalformedChunkParameters(_))
        ));
        assert!(matches!(
            ChunkParams::new(100, 0),
            Err(AppError::MalformedChunkParameters(_))
        ));
    }

    #[test]
    fn test_split_empty() {
        assert!(split("doc", "", params(100, 10)).is_empty());
        assert!(split("doc", "   \n\t ", params(100, 10)).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let text = "Ghana's inflation rate fell to 18% in May 2025.";
        let chunks = split("doc", text, params(500, 50));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].char_range, (0, text.chars().count()));
    }

    #[test]
    fn test_hard_cut_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let chunks = split("doc", &text, params(50, 10));

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .text
                .chars()
                .skip(pair[0].text.chars().count() - 10)
                .collect();
            let head: String = pair[1].text.chars().take(10).collect();
            assert_eq!(tail, head);
        }
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 50);
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let first = "a".repeat(40);
        let second = "b".repeat(40);
        let text = format!("{}\n\n{}", first, second);
        let chunks = split("doc", &text, params(60, 5));

        assert_eq!(chunks[0].text, format!("{}\n\n", first));
        assert_eq!(chunks[0].char_range, (0, 42));
        assert_eq!(chunks[1].char_range.0, 37);
    }

    #[test]
    fn test_prefers_sentence_over_word_break() {
        let text = "One two three four five. Six seven eight nine ten eleven twelve";
        let chunks = split("doc", text, params(40, 5));

        assert_eq!(chunks[0].text, "One two three four five. ");
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "Cédi é ñ 🎮 ".repeat(30);
        let chunks = split("doc", &text, params(25, 5));

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 25);
        }
        let last = chunks.last().unwrap();
        assert_eq!(last.char_range.1, text.chars().count());
    }

    #[test]
    fn test_split_deterministic() {
        let text = "Policy rate held at 28%. The cedi appreciated.\n".repeat(20);
        let a = split("doc", &text, params(120, 20));
        let b = split("doc", &text, params(120, 20));
        assert_eq!(a, b);
    }

    #[test]
    fn test_whitespace_window_skipped() {
        let text = format!("{}{}", "x".repeat(20), " ".repeat(100));
        let chunks = split("doc", &text, params(30, 5));

        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
        let positions: Vec<u32> = chunks.iter().map(|c| c.position).collect();
        let expected: Vec<u32> = (0..chunks.len() as u32).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_split_documents_in_order() {
        let docs = vec![
            SourceDocument::new("a.json#0", "first document"),
            SourceDocument::new("a.json#1", ""),
            SourceDocument::new("b.md", "second document"),
        ];
        let chunks = split_documents(&docs, params(500, 50));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source, "a.json#0");
        assert_eq!(chunks[1].source, "b.md");
    }
}
