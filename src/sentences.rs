use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum SentenceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} must contain a JSON array of strings: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load the ordered sentence list from a JSON array of strings.
///
/// The position of each sentence in the array is its output index.
pub fn load_sentences(path: &Path) -> Result<Vec<String>, SentenceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SentenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SentenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
