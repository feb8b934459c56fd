//! Ranking correctness against a persistent collection.

use crate::index::SqliteIndex;
use crate::vector_index::VectorIndex;
use tempfile::TempDir;

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn open(temp: &TempDir) -> SqliteIndex {
    SqliteIndex::open(&temp.path().join("index.sqlite"), "ranking").unwrap()
}

#[test]
fn test_relevant_entry_scores_highest() {
    let temp = TempDir::new().unwrap();
    let index = open(&temp);

    index
        .add(&[
            (
                "Monetary policy rate held at 28%".to_string(),
                normalize(&[1.0, 0.5, 0.2, 0.1]),
            ),
            (
                "Cocoa harvest outlook".to_string(),
                normalize(&[-0.3, -0.8, 0.4, -0.2]),
            ),
        ])
        .unwrap();

    let result = index.query(&normalize(&[0.9, 0.4, 0.3, 0.1]), 5).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.hits[0].id, 0, "Most relevant entry should be first");
    assert!(
        result.hits[0].score > 0.8,
        "Relevant entry score should be high: {}",
        result.hits[0].score
    );
    assert!(result.hits[0].score > result.hits[1].score);
}

#[test]
fn test_orthogonal_entry_scores_low() {
    let temp = TempDir::new().unwrap();
    let index = open(&temp);

    index
        .add(&[("Treasury bill yields".to_string(), vec![1.0, 0.0, 0.0, 0.0])])
        .unwrap();

    let result = index.query(&[0.0, 1.0, 0.0, 0.0], 5).unwrap();

    // No relevance cut-off: the entry is still returned
    assert_eq!(result.len(), 1);
    assert!(result.hits[0].score.abs() < 1e-6);
}

#[test]
fn test_scores_non_increasing_and_bounded_by_k() {
    let temp = TempDir::new().unwrap();
    let index = open(&temp);

    let entries: Vec<(String, Vec<f32>)> = (0..10)
        .map(|i| {
            let angle = i as f32 * 0.15;
            (format!("entry {}", i), vec![angle.cos(), angle.sin()])
        })
        .collect();
    index.add(&entries).unwrap();

    for k in [1, 3, 10, 25] {
        let result = index.query(&[1.0, 0.0], k).unwrap();
        assert_eq!(result.len(), k.min(10));

        let scores = result.scores();
        for pair in scores.windows(2) {
            assert!(pair[0] >= pair[1], "Scores should be ordered: {:?}", scores);
        }
    }

    let ids: Vec<u64> = index.query(&[1.0, 0.0], 3).unwrap().hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_equal_scores_break_ties_by_id() {
    let temp = TempDir::new().unwrap();
    let index = open(&temp);

    index
        .add(&[
            ("low".to_string(), vec![0.0, 1.0]),
            ("first twin".to_string(), vec![2.0, 0.0]),
            ("second twin".to_string(), vec![1.0, 0.0]),
        ])
        .unwrap();

    let result = index.query(&[1.0, 0.0], 2).unwrap();
    assert_eq!(result.texts().collect::<Vec<_>>(), vec!["first twin", "second twin"]);
}
