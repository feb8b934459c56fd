//! On-disk layout of collections under the workspace state directory.

use insight_core::config::STATE_DIR;
use std::path::{Path, PathBuf};

/// Index database file name inside a collection directory.
pub const INDEX_FILE: &str = "index.sqlite";

/// `.insight/collections/<collection>/`
pub fn get_collection_dir(workspace: &Path, collection: &str) -> PathBuf {
    workspace
        .join(STATE_DIR)
        .join("collections")
        .join(collection)
}

/// `.insight/collections/<collection>/index.sqlite`
pub fn get_index_path(workspace: &Path, collection: &str) -> PathBuf {
    get_collection_dir(workspace, collection).join(INDEX_FILE)
}
