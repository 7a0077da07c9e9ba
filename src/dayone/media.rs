//! Media acquisition
//!
//! Media bytes come from one of two sources, chosen once per run: a
//! directory on disk laid out like a Day One export (`photos/`, `audios/`,
//! `videos/`), or an in-memory index of file name to bytes built from a
//! selected folder or an export archive.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use super::schema::is_plain_file_component;
use super::transform::MediaReference;

/// Source of media bytes for the importer.
///
/// `Ok(None)` means the file is simply not available; the note keeps its
/// reference and the import carries on.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn fetch(&self, reference: &MediaReference) -> std::io::Result<Option<Vec<u8>>>;

    /// Short description for logs and summaries
    fn describe(&self) -> String;
}

/// Reads `<base_dir>/<kind subfolder>/<identifier>.<ext>` from disk
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Path of the referenced file, or `None` if its name would leave the
    /// kind subfolder
    pub fn source_path(&self, reference: &MediaReference) -> Option<PathBuf> {
        let filename = reference.filename();
        if !is_plain_file_component(&reference.identifier) || !is_plain_file_component(&filename) {
            return None;
        }

        Some(self.base_dir.join(reference.subfolder()).join(filename))
    }
}

#[async_trait]
impl MediaResolver for PathResolver {
    async fn fetch(&self, reference: &MediaReference) -> std::io::Result<Option<Vec<u8>>> {
        let Some(path) = self.source_path(reference) else {
            log::warn!("Refusing media file name {:?}", reference.filename());
            return Ok(None);
        };

        match tokio::fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.base_dir.display())
    }
}

/// Looks media up by exact file name in a prebuilt index
#[derive(Default)]
pub struct IndexResolver {
    files: HashMap<String, Vec<u8>>,
}

impl IndexResolver {
    pub fn new(files: HashMap<String, Vec<u8>>) -> Self {
        Self { files }
    }

    /// Index every file below `dir` by its file name.
    ///
    /// Hidden files are skipped. When two files share a name the first one
    /// found wins.
    pub fn from_directory(dir: &Path) -> std::io::Result<Self> {
        if !dir.is_dir() {
            return Err(std::io::Error::new(
                ErrorKind::NotFound,
                format!("Media folder is not a directory: {}", dir.display()),
            ));
        }

        let mut files = HashMap::new();

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if files.contains_key(&name) {
                log::debug!("Ignoring duplicate media file name {:?}", entry.path());
                continue;
            }

            let data = std::fs::read(entry.path())?;
            files.insert(name, data);
        }

        log::info!("Indexed {} media files from {}", files.len(), dir.display());
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl MediaResolver for IndexResolver {
    async fn fetch(&self, reference: &MediaReference) -> std::io::Result<Option<Vec<u8>>> {
        Ok(self.files.get(&reference.filename()).cloned())
    }

    fn describe(&self) -> String {
        format!("index of {} files", self.files.len())
    }
}

/// Resolver for runs without any media source; every reference dangles
pub struct NoMedia;

#[async_trait]
impl MediaResolver for NoMedia {
    async fn fetch(&self, _reference: &MediaReference) -> std::io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn describe(&self) -> String {
        "no media source".to_string()
    }
}
