use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::document_store::{DocumentStore, Result, StoreError, StoredFile};

/// In-memory document store, for embedding hosts that own persistence themselves
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    folders: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of a stored file, if any
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        // A poisoned lock only means another test thread panicked mid-write
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize(path);
        let inner = self.lock();
        Ok(inner.files.contains_key(&path) || inner.folders.contains(&path))
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut inner = self.lock();

        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            inner.folders.insert(current.clone());
        }
        Ok(())
    }

    async fn create(&self, path: &str, text: &str) -> Result<()> {
        let path = normalize(path);
        let mut inner = self.lock();

        if inner.files.contains_key(&path) || inner.folders.contains(&path) {
            return Err(StoreError::AlreadyExists(path));
        }
        inner.files.insert(path, text.as_bytes().to_vec());
        Ok(())
    }

    async fn create_binary(&self, path: &str, data: &[u8]) -> Result<()> {
        self.lock().files.insert(normalize(path), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        let path = normalize(path);
        self.lock()
            .files
            .get(&path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .ok_or(StoreError::NotFound(path))
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        Ok(self.lock().files.keys().map(|p| StoredFile::from_path(p)).collect())
    }
}
