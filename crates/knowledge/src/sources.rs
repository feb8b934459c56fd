//! Document readers for the corpus directory.
//!
//! Supported inputs:
//! - `.json`: an array of publication records (or a single record); the
//!   configured text field of each record becomes one document
//! - `.txt` / `.md`: the whole file is one document

use crate::types::SourceDocument;
use insight_core::{AppError, AppResult, KnowledgeConfig};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::WalkDir;

/// Which field of a JSON record holds the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub text_field: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            text_field: "publication_description".to_string(),
        }
    }
}

impl From<&KnowledgeConfig> for SourceConfig {
    fn from(config: &KnowledgeConfig) -> Self {
        Self {
            text_field: config.text_field.clone(),
        }
    }
}

/// Load every supported document under `data_dir`, sorted by path.
pub fn load_documents(data_dir: &Path, config: &SourceConfig) -> AppResult<Vec<SourceDocument>> {
    if !data_dir.is_dir() {
        return Err(AppError::Config(format!(
            "Data directory {:?} does not exist",
            data_dir
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(data_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let key = path
            .strip_prefix(data_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => {
                let docs = read_json_documents(path, &key, &config.text_field)?;
                tracing::debug!("Read {} records from {:?}", docs.len(), path);
                documents.extend(docs);
            }
            Some("txt") | Some("md") => {
                let text = std::fs::read_to_string(path)?;
                if text.trim().is_empty() {
                    tracing::warn!("Skipping empty file {:?}", path);
                    continue;
                }
                documents.push(SourceDocument::new(key, text));
            }
            _ => tracing::debug!("Skipping unsupported file {:?}", path),
        }
    }

    tracing::info!(
        "Loaded {} documents from {:?}",
        documents.len(),
        data_dir
    );

    Ok(documents)
}

fn read_json_documents(path: &Path, key: &str, text_field: &str) -> AppResult<Vec<SourceDocument>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        AppError::Serialization(format!("Failed to parse {:?}: {}", path, e))
    })?;

    let records = match value {
        Value::Array(records) => records,
        record @ Value::Object(_) => vec![record],
        _ => {
            return Err(AppError::Serialization(format!(
                "{:?} must contain a JSON array of records",
                path
            )))
        }
    };

    let mut documents = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match record.get(text_field).and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => {
                documents.push(SourceDocument::new(format!("{}#{}", key, i), text));
            }
            _ => tracing::warn!("Record {} in {:?} has no '{}' text", i, path, text_field),
        }
    }

    Ok(documents)
}

/// SHA-256 over every document key and text, hex encoded.
pub fn corpus_fingerprint(documents: &[SourceDocument]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.key.as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.text.as_bytes());
        hasher.update([0u8]);
    }

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
