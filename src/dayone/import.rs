//! Day One import run
//!
//! Drives a whole export into the store: one note per entry, media copied
//! into `attachments/`, and a `Failed Imports` note listing every entry that
//! could not be converted. Entries are processed one after another and a
//! failing entry never stops the run.

use chrono::FixedOffset;
use futures_util::future::join_all;
use serde::Serialize;

use super::errors::{ImportError, Result};
use super::media::MediaResolver;
use super::schema::{EntryRecord, ImportDocument};
use super::transform::{transform_entry, transform_entry_in, MediaReference, TransformedEntry, ATTACHMENTS_DIR};
use crate::config::{DuplicatePolicy, ImportConfiguration};
use crate::store::{join_path, DocumentStore, StoreError};

/// Name of the note listing failed entries
pub const FAILED_IMPORTS_NOTE: &str = "Failed Imports";

/// An entry that could not be imported
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedEntry {
    pub uuid: Option<String>,
    pub creation_date: Option<String>,
    pub error: String,
}

impl FailedEntry {
    fn new(entry: &EntryRecord, error: &ImportError) -> Self {
        Self {
            uuid: entry.uuid.clone(),
            creation_date: entry.creation_date.clone(),
            error: error.to_string(),
        }
    }
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: Vec<FailedEntry>,
    /// Media files written to the store
    pub media_copied: usize,
    /// Media files already present in the store
    pub media_existing: usize,
    /// Media files the resolver did not have
    pub media_missing: usize,
    /// Media files that could not be read or written
    pub media_failed: usize,
    /// Store path of the failure report, if one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_report: Option<String>,
}

impl ImportReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Imported {} entries. {} skipped. {} failed.",
            self.succeeded,
            self.skipped,
            self.failed_count()
        )
    }
}

/// What happened to a single entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Imported { path: String },
    Skipped { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaOutcome {
    Copied,
    AlreadyPresent,
    Missing,
    Failed,
}

/// Imports Day One entries into a [`DocumentStore`]
pub struct Importer<'a> {
    store: &'a dyn DocumentStore,
    media: &'a dyn MediaResolver,
    config: &'a ImportConfiguration,
    offset: Option<FixedOffset>,
}

impl<'a> Importer<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        media: &'a dyn MediaResolver,
        config: &'a ImportConfiguration,
    ) -> Self {
        Self {
            store,
            media,
            config,
            offset: None,
        }
    }

    /// Derive date-based note names at a fixed UTC offset instead of local time
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    fn folder(&self) -> &str {
        &self.config.import_folder
    }

    fn attachments_folder(&self) -> String {
        join_path(&[self.folder(), ATTACHMENTS_DIR])
    }

    /// Import every entry of `document`
    pub async fn run(&self, document: &ImportDocument) -> Result<ImportReport> {
        self.run_with_progress(document, |_, _, _| {}).await
    }

    /// Import every entry, reporting `(done, total, message)` after each one.
    ///
    /// Only a failure to prepare the destination folders is returned as an
    /// error; everything per entry ends up in the report.
    pub async fn run_with_progress<F>(&self, document: &ImportDocument, progress: F) -> Result<ImportReport>
    where
        F: Fn(usize, usize, &str),
    {
        let total = document.entries.len();
        log::info!(
            "Importing {} entries into {:?} (media: {})",
            total,
            self.folder(),
            self.media.describe()
        );

        self.ensure_folders().await?;

        let mut report = ImportReport::default();

        for (index, entry) in document.entries.iter().enumerate() {
            match self.import_entry(entry, &mut report).await {
                Ok(EntryOutcome::Imported { path }) => {
                    log::debug!("Imported {}", path);
                    report.succeeded += 1;
                }
                Ok(EntryOutcome::Skipped { path }) => {
                    log::info!("Skipping {}: note already exists", path);
                    report.skipped += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Failed to import entry {}: {}",
                        entry.uuid.as_deref().unwrap_or("<no uuid>"),
                        e
                    );
                    report.failed.push(FailedEntry::new(entry, &e));
                }
            }

            progress(index + 1, total, entry.uuid.as_deref().unwrap_or_default());
        }

        if !report.failed.is_empty() {
            match self.write_failure_report(&report.failed).await {
                Ok(path) => report.failure_report = Some(path),
                Err(e) => log::error!("Failed to write failure report: {}", e),
            }
        }

        log::info!("{}", report.summary());
        Ok(report)
    }

    /// Create the import folder and its attachments folder if missing
    async fn ensure_folders(&self) -> Result<()> {
        for folder in [self.folder().to_string(), self.attachments_folder()] {
            if !self.store.exists(&folder).await? {
                log::info!("Creating folder {}", folder);
                self.store.create_folder(&folder).await?;
            }
        }
        Ok(())
    }

    fn transform(&self, entry: &EntryRecord) -> Result<TransformedEntry> {
        match &self.offset {
            Some(offset) => transform_entry_in(entry, self.config, offset),
            None => transform_entry(entry, self.config),
        }
    }

    /// Convert and write one entry, then copy its media.
    /// Media problems are tallied in `report` but never fail the entry.
    pub async fn import_entry(&self, entry: &EntryRecord, report: &mut ImportReport) -> Result<EntryOutcome> {
        let transformed = self.transform(entry)?;
        let path = join_path(&[self.folder(), &format!("{}.md", transformed.identity)]);

        if self.store.exists(&path).await? {
            return self.duplicate(path, &transformed.identity);
        }

        match self.store.create(&path, &transformed.body).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => return self.duplicate(path, &transformed.identity),
            Err(e) => return Err(e.into()),
        }

        for outcome in self.copy_media(&transformed.media).await {
            match outcome {
                MediaOutcome::Copied => report.media_copied += 1,
                MediaOutcome::AlreadyPresent => report.media_existing += 1,
                MediaOutcome::Missing => report.media_missing += 1,
                MediaOutcome::Failed => report.media_failed += 1,
            }
        }

        Ok(EntryOutcome::Imported { path })
    }

    fn duplicate(&self, path: String, identity: &str) -> Result<EntryOutcome> {
        match self.config.on_duplicate {
            DuplicatePolicy::Skip => Ok(EntryOutcome::Skipped { path }),
            DuplicatePolicy::Fail => Err(ImportError::DuplicateNote(identity.to_string())),
        }
    }

    /// Copy all media of one entry concurrently; all copies finish before returning
    async fn copy_media(&self, references: &[MediaReference]) -> Vec<MediaOutcome> {
        join_all(references.iter().map(|reference| self.copy_one(reference))).await
    }

    async fn copy_one(&self, reference: &MediaReference) -> MediaOutcome {
        let filename = reference.filename();
        let target = join_path(&[&self.attachments_folder(), &filename]);

        match self.store.exists(&target).await {
            Ok(true) => return MediaOutcome::AlreadyPresent,
            Ok(false) => {}
            Err(e) => {
                log::warn!("Could not check {}: {}", target, e);
                return MediaOutcome::Failed;
            }
        }

        let data = match self.media.fetch(reference).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                log::debug!("Media file {} not found in {}", filename, self.media.describe());
                return MediaOutcome::Missing;
            }
            Err(e) => {
                log::warn!("Failed to read media file {}: {}", filename, e);
                return MediaOutcome::Failed;
            }
        };

        match self.store.create_binary(&target, &data).await {
            Ok(()) => MediaOutcome::Copied,
            Err(e) => {
                log::warn!("Failed to write media file {}: {}", target, e);
                MediaOutcome::Failed
            }
        }
    }

    /// Write the failure report without replacing one from an earlier run
    async fn write_failure_report(&self, failed: &[FailedEntry]) -> Result<String> {
        let content = failure_report_markdown(failed);

        let mut name = FAILED_IMPORTS_NOTE.to_string();
        let mut counter = 1;
        loop {
            let path = join_path(&[self.folder(), &format!("{}.md", name)]);
            match self.store.create(&path, &content).await {
                Ok(()) => return Ok(path),
                Err(StoreError::AlreadyExists(_)) => {
                    name = format!("{} {}", FAILED_IMPORTS_NOTE, counter);
                    counter += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// What an entry would become, without touching any store
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntryPreview {
    pub uuid: Option<String>,
    /// Note path inside the store, when the entry converts
    pub path: Option<String>,
    pub media_count: usize,
    pub error: Option<String>,
}

/// Convert every entry and report the resulting note paths or errors
pub fn preview_entries(
    document: &ImportDocument,
    config: &ImportConfiguration,
    offset: Option<FixedOffset>,
) -> Vec<EntryPreview> {
    document
        .entries
        .iter()
        .map(|entry| {
            let result = match &offset {
                Some(offset) => transform_entry_in(entry, config, offset),
                None => transform_entry(entry, config),
            };

            match result {
                Ok(transformed) => EntryPreview {
                    uuid: entry.uuid.clone(),
                    path: Some(join_path(&[
                        &config.import_folder,
                        &format!("{}.md", transformed.identity),
                    ])),
                    media_count: transformed.media.len(),
                    error: None,
                },
                Err(e) => EntryPreview {
                    uuid: entry.uuid.clone(),
                    path: None,
                    media_count: 0,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect()
}

/// Render the failure report note
pub fn failure_report_markdown(failed: &[FailedEntry]) -> String {
    let mut lines: Vec<String> = vec![format!("# {}", FAILED_IMPORTS_NOTE), String::new()];

    for entry in failed {
        lines.push(format!("## Entry: {}", entry.uuid.as_deref().unwrap_or("unknown")));
        lines.push(format!("- Date: {}", entry.creation_date.as_deref().unwrap_or("unknown")));
        lines.push(format!("- Error: {}", entry.error));
        lines.push(String::new());
    }

    lines.join("\n")
}
