use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A file known to the store, addressed by its store-relative path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Store-relative path, `/`-separated
    pub path: String,
    /// File name including extension
    pub name: String,
    /// Lowercased extension without the dot (empty if none)
    pub extension: String,
}

impl StoredFile {
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        };

        Self {
            path: path.to_string(),
            name,
            extension,
        }
    }

    /// Directory part of the path ("" for files at the store root)
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }
}

/// The document store that imported notes and media are written into.
///
/// Every operation is independently awaited. Paths are relative to the store
/// root and use `/` as separator regardless of platform.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether a file or folder exists at `path`
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a folder (and any missing parents). Existing folders are left as is.
    async fn create_folder(&self, path: &str) -> Result<()>;

    /// Create a text file. Fails with [`StoreError::AlreadyExists`] if `path` is taken.
    async fn create(&self, path: &str, text: &str) -> Result<()>;

    /// Create a binary file.
    async fn create_binary(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read a text file.
    async fn read(&self, path: &str) -> Result<String>;

    /// List every file in the store.
    async fn list_files(&self) -> Result<Vec<StoredFile>>;
}

/// Join store path segments with `/`, skipping empty segments
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
