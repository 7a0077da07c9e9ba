use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::document_store::{DocumentStore, Result, StoreError, StoredFile};

/// Document store backed by a directory on disk (an Obsidian-style vault)
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a store-relative path to an absolute path inside the vault.
    ///
    /// Absolute paths and `..` components are rejected so nothing is written
    /// outside `base_path`.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let mut resolved = self.base_path.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StoreError::InvalidPath(path.to_string())),
            }
        }

        Ok(resolved)
    }

    async fn ensure_parent(&self, full_path: &Path) -> Result<()> {
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.resolve(path)?;
        Ok(fs::try_exists(&full_path).await?)
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path)?;
        fs::create_dir_all(&full_path).await?;
        Ok(())
    }

    async fn create(&self, path: &str, text: &str) -> Result<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn create_binary(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;
        fs::write(&full_path, data).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full_path = self.resolve(path)?;
        match fs::read(&full_path).await {
            // Exports occasionally carry invalid UTF-8 around emoji; fall back to lossy
            Ok(bytes) => Ok(String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_files(&self) -> Result<Vec<StoredFile>> {
        let base_path = self.base_path.clone();

        let files = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();

            for entry in WalkDir::new(&base_path)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }

                let relative = entry.path().strip_prefix(&base_path).unwrap_or(entry.path());
                let path = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join("/");

                files.push(StoredFile::from_path(&path));
            }

            files.sort_by(|a, b| a.path.cmp(&b.path));
            files
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(ErrorKind::Other, e)))?;

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_create_never_overwrites() {
        let (store, _temp) = create_test_store();

        store.create("Import/note.md", "first").await.unwrap();
        let err = store.create("Import/note.md", "second").await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists(ref p) if p == "Import/note.md"));
        assert_eq!(store.read("Import/note.md").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_create_folder_is_idempotent() {
        let (store, temp) = create_test_store();

        store.create_folder("Import/attachments").await.unwrap();
        store.create_folder("Import/attachments").await.unwrap();

        assert!(store.exists("Import").await.unwrap());
        assert!(temp.path().join("Import").join("attachments").is_dir());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let (store, _temp) = create_test_store();

        assert!(matches!(
            store.create("../outside.md", "x").await,
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.exists("/etc/passwd").await,
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (store, _temp) = create_test_store();
        assert!(matches!(store.read("nope.md").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_files_skips_hidden() {
        let (store, temp) = create_test_store();

        std::fs::create_dir_all(temp.path().join(".obsidian")).unwrap();
        std::fs::write(temp.path().join(".obsidian").join("app.json"), "{}").unwrap();
        store.create("Journal.json", "{}").await.unwrap();
        store.create_binary("Import/attachments/p.jpg", &[0xFF, 0xD8]).await.unwrap();

        let files = store.list_files().await.unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, vec!["Import/attachments/p.jpg", "Journal.json"]);
        assert_eq!(files[1].extension, "json");
    }
}
