use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use dayone_lib::config::{ConfigStore, ImportConfiguration};
use dayone_lib::dayone::{
    is_export_archive, read_export_archive, ImportDocument, IndexResolver, MediaResolver, PathResolver,
};
use dayone_lib::store::{DocumentStore, FileStore};

use crate::SourceArgs;

/// Shared application state for CLI commands
pub struct App {
    pub store: FileStore,
    pub config_store: ConfigStore,
    pub config: ImportConfiguration,
}

/// A parsed export plus the media source that goes with it
pub struct ImportSource {
    /// Where the JSON was read from, for messages
    pub label: String,
    pub document: ImportDocument,
    pub media: Box<dyn MediaResolver>,
}

impl App {
    /// Open the vault (default: current directory) and load saved settings
    pub fn new(vault: Option<&Path>) -> Result<Self> {
        let vault = match vault {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        if !vault.is_dir() {
            bail!("Vault is not a directory: {}", vault.display());
        }

        let config_dir = ConfigStore::default_dir().context("Failed to get config directory")?;
        let config_store = ConfigStore::new(config_dir);
        let config = config_store
            .load()
            .with_context(|| format!("Failed to load {}", config_store.settings_path().display()))?;

        Ok(Self {
            store: FileStore::new(vault),
            config_store,
            config,
        })
    }

    /// Read the export JSON and pick the media strategy for this run
    pub async fn load_source(&self, args: &SourceArgs) -> Result<ImportSource> {
        // A zip passed as --input is read as an export archive
        let archive = args
            .archive
            .as_ref()
            .or_else(|| args.input.as_ref().filter(|input| is_export_archive(input)));

        if let Some(archive) = archive {
            let path = archive.clone();
            let export = tokio::task::spawn_blocking(move || read_export_archive(&path))
                .await
                .context("Archive reader stopped unexpectedly")?
                .with_context(|| format!("Failed to read archive {}", archive.display()))?;

            let label = format!("{} ({})", archive.display(), export.journal_name);
            let document = ImportDocument::parse(&export.journal_json)
                .with_context(|| format!("Failed to parse {}", label))?;

            return Ok(ImportSource {
                label,
                document,
                media: Box::new(export.media),
            });
        }

        let (label, json, export_dir) = match &args.input {
            Some(input) => {
                let json = tokio::fs::read_to_string(input)
                    .await
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
                (input.display().to_string(), json, dir)
            }
            None => self.first_vault_json().await?,
        };

        let document = ImportDocument::parse(&json).with_context(|| format!("Failed to parse {}", label))?;

        let media: Box<dyn MediaResolver> = match (&args.media_index, &args.media_dir) {
            (Some(dir), _) => {
                let dir = dir.clone();
                let index = tokio::task::spawn_blocking(move || IndexResolver::from_directory(&dir))
                    .await
                    .context("Media indexer stopped unexpectedly")?
                    .context("Failed to index media folder")?;
                Box::new(index)
            }
            (None, Some(dir)) => Box::new(PathResolver::new(dir.clone())),
            (None, None) => Box::new(PathResolver::new(export_dir)),
        };

        Ok(ImportSource { label, document, media })
    }

    /// The first JSON file in the vault, read through the store
    async fn first_vault_json(&self) -> Result<(String, String, PathBuf)> {
        let files = self.store.list_files().await.context("Failed to list vault files")?;

        let Some(file) = files.into_iter().find(|f| f.extension == "json") else {
            bail!("No Day One JSON export found in {}", self.store.base_path().display());
        };

        let json = self
            .store
            .read(&file.path)
            .await
            .with_context(|| format!("Failed to read {}", file.path))?;
        let dir = self.store.base_path().join(file.parent());

        Ok((file.path.clone(), json, dir))
    }
}
