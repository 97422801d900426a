//! Loading the static document corpus

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// A whole document read from the corpus directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: PathBuf,
    pub content: String,
}

/// Corpus loading errors
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read document {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read every file in `dir` (not recursing) whose extension is `extension`
///
/// Documents come back in file-name order. An empty corpus is allowed.
pub fn load_corpus(dir: &Path, extension: &str) -> Result<Vec<Document>, CorpusError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CorpusError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CorpusError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extension) {
            paths.push(path);
        }
    }
    paths.sort();

    let documents = paths
        .into_iter()
        .map(|path| {
            let content = std::fs::read_to_string(&path).map_err(|source| CorpusError::ReadFile {
                path: path.clone(),
                source,
            })?;
            Ok(Document {
                source: path,
                content,
            })
        })
        .collect::<Result<Vec<_>, CorpusError>>()?;

    if documents.is_empty() {
        warn!(
            dir = %dir.display(),
            extension,
            "No documents found; every retrieval will fall back to web search"
        );
    } else {
        info!(dir = %dir.display(), documents = documents.len(), "Corpus loaded");
    }

    Ok(documents)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension.trim_start_matches('.')))
}
