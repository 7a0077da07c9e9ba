//! Day One ZIP export reading
//!
//! A Day One export archive holds one JSON document per journal at the top
//! level plus `photos/`, `audios/` and `videos/` folders. The journal JSON is
//! returned as text and every other file is indexed by name for the
//! [`IndexResolver`].

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::errors::{ImportError, Result};
use super::media::IndexResolver;

/// Contents of an export archive
pub struct ExportArchive {
    /// Name of the journal document inside the archive
    pub journal_name: String,
    pub journal_json: String,
    pub media: IndexResolver,
}

/// Check if path looks like a Day One export archive
pub fn is_export_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
            == Some("zip")
}

/// Read the journal document and media index from an export archive.
///
/// With several journals in one archive the alphabetically first is used.
pub fn read_export_archive(path: &Path) -> Result<ExportArchive> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut journals: Vec<(String, String)> = Vec::new();
    let mut media: HashMap<String, Vec<u8>> = HashMap::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let entry_path = entry.name().to_string();
        let filename = entry_path
            .rsplit('/')
            .next()
            .unwrap_or(&entry_path)
            .to_string();

        if filename.is_empty() || filename.starts_with('.') || entry_path.starts_with("__MACOSX/") {
            continue;
        }

        let is_top_level = !entry_path.contains('/');

        if is_top_level && filename.to_lowercase().ends_with(".json") {
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;

            // Journal text may carry invalid UTF-8 around emoji; fall back to lossy
            let content = String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

            journals.push((filename, content));
        } else {
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            media.entry(filename).or_insert(data);
        }
    }

    journals.sort_by(|a, b| a.0.cmp(&b.0));

    if journals.len() > 1 {
        log::info!(
            "Archive contains {} journals, importing {}",
            journals.len(),
            journals[0].0
        );
    }

    let (journal_name, journal_json) = journals
        .into_iter()
        .next()
        .ok_or_else(|| ImportError::ExportNotFound(format!("no journal JSON in {}", path.display())))?;

    Ok(ExportArchive {
        journal_name,
        journal_json,
        media: IndexResolver::new(media),
    })
}
