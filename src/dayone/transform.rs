//! Entry to note conversion
//!
//! A pure mapping from one [`EntryRecord`] plus the configuration to a note
//! identity, its Markdown body, and the media files the body refers to.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{ImportError, Result};
use super::schema::{EntryRecord, MediaKind};
use crate::config::ImportConfiguration;

/// Folder (relative to the import folder) that receives copied media
pub const ATTACHMENTS_DIR: &str = "attachments";

/// A media file an imported note links to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaReference {
    pub kind: MediaKind,
    pub identifier: String,
    /// Declared extension, or the kind's default
    pub extension: String,
}

impl MediaReference {
    /// `<identifier>.<extension>`, the name in both the export and the store
    pub fn filename(&self) -> String {
        format!("{}.{}", self.identifier, self.extension)
    }

    /// Export subfolder this file lives in (`photos`, `audios`, `videos`)
    pub fn subfolder(&self) -> &'static str {
        self.kind.subfolder()
    }

    /// Link target used inside the note
    pub fn link_target(&self) -> String {
        format!("{}/{}", ATTACHMENTS_DIR, self.filename())
    }
}

/// Everything the importer needs to write one entry
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedEntry {
    /// Note name without the `.md` extension
    pub identity: String,
    pub body: String,
    pub media: Vec<MediaReference>,
}

/// Convert one entry using the local time zone for date-based names
pub fn transform_entry(entry: &EntryRecord, config: &ImportConfiguration) -> Result<TransformedEntry> {
    transform_entry_in(entry, config, &Local)
}

/// Convert one entry, deriving date-based names in `tz`
pub fn transform_entry_in<Tz: TimeZone>(
    entry: &EntryRecord,
    config: &ImportConfiguration,
    tz: &Tz,
) -> Result<TransformedEntry>
where
    Tz::Offset: std::fmt::Display,
{
    if entry.uuid.is_none() {
        return Err(ImportError::MissingField("uuid"));
    }
    if entry.creation_date.is_none() {
        return Err(ImportError::MissingField("creationDate"));
    }

    Ok(TransformedEntry {
        identity: generate_filename_in(entry, config, tz)?,
        body: generate_markdown(entry, config),
        media: media_references(entry),
    })
}

/// Note identity in the local time zone
pub fn generate_filename(entry: &EntryRecord, config: &ImportConfiguration) -> Result<String> {
    generate_filename_in(entry, config, &Local)
}

/// Note identity: the UUID verbatim, or `YYYY-MM-DD_HH-MM-SS` of the
/// creation date in `tz`. Entries created in the same second collide.
pub fn generate_filename_in<Tz: TimeZone>(
    entry: &EntryRecord,
    config: &ImportConfiguration,
    tz: &Tz,
) -> Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    if config.use_uuid_filenames {
        return entry.uuid.clone().ok_or(ImportError::MissingField("uuid"));
    }

    let raw = entry
        .creation_date
        .as_deref()
        .ok_or(ImportError::MissingField("creationDate"))?;

    let date = parse_entry_date(raw, tz).ok_or_else(|| ImportError::InvalidDate(raw.to_string()))?;

    Ok(date.format("%Y-%m-%d_%H-%M-%S").to_string())
}

/// Parse a Day One timestamp into `tz`.
///
/// Accepts RFC 3339 / ISO 8601 with an offset, a zone-less date-time (read as
/// wall-clock time in `tz`), or a bare date (midnight UTC). A wall-clock time
/// skipped by a daylight saving change moves forward by an hour.
pub fn parse_entry_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(tz));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(localize(naive, tz));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(tz))
}

fn localize<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive).with_timezone(tz)),
    }
}

/// Render the note: front matter, body text, then one section per media kind
pub fn generate_markdown(entry: &EntryRecord, config: &ImportConfiguration) -> String {
    let mut lines: Vec<String> = Vec::new();
    let creation_date = entry.creation_date.as_deref().unwrap_or_default();

    lines.push("---".to_string());
    lines.push(format!("date: {}", creation_date));
    lines.push(format!(
        "modified: {}",
        entry.modified_date.as_deref().unwrap_or(creation_date)
    ));

    if entry.starred {
        lines.push("starred: true".to_string());
    }
    if entry.is_pinned {
        lines.push("pinned: true".to_string());
    }
    if entry.is_all_day {
        lines.push("all-day: true".to_string());
    }

    if config.include_tags {
        if let Some(tags) = &entry.tags {
            lines.push(format!("tags: [{}]", tags.join(", ")));
        }
    }

    if config.include_location {
        if let Some(loc) = &entry.location {
            if let Some(place) = &loc.place_name {
                lines.push(format!("location: \"{}\"", escape_yaml_string(place)));
            }
            if let Some(city) = &loc.locality_name {
                lines.push(format!("city: \"{}\"", escape_yaml_string(city)));
            }
            if let Some(country) = &loc.country {
                lines.push(format!("country: \"{}\"", escape_yaml_string(country)));
            }
            if let (Some(lat), Some(lon)) = (loc.latitude, loc.longitude) {
                lines.push(format!("coordinates: [{}, {}]", format_number(lat), format_number(lon)));
            }
        }
    }

    if config.include_weather {
        if let Some(weather) = &entry.weather {
            if let Some(code) = &weather.weather_code {
                lines.push(format!("weather: \"{}\"", escape_yaml_string(code)));
            }
            // 0 °C is a real reading, so only absence suppresses the line
            if let Some(temperature) = weather.temperature_celsius {
                lines.push(format!("temperature: {}", format_number(temperature)));
            }
        }
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(entry_text(entry));

    let references = media_references(entry);
    for kind in MediaKind::ALL {
        let of_kind: Vec<&MediaReference> = references.iter().filter(|r| r.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }

        lines.push(String::new());
        lines.push(section_heading(kind).to_string());

        for (index, reference) in of_kind.into_iter().enumerate() {
            lines.push(embed_line(reference, index));
        }
    }

    lines.join("\n")
}

/// Media files referenced by the entry, in photos/audios/videos order
pub fn media_references(entry: &EntryRecord) -> Vec<MediaReference> {
    MediaKind::ALL
        .iter()
        .flat_map(|&kind| {
            entry.media(kind).iter().map(move |item| MediaReference {
                kind,
                identifier: item.identifier.clone(),
                extension: item
                    .extension
                    .clone()
                    .unwrap_or_else(|| kind.default_extension().to_string()),
            })
        })
        .collect()
}

/// Body text: decoded rich text when it yields anything, else the plain text
fn entry_text(entry: &EntryRecord) -> String {
    entry
        .rich_text
        .as_ref()
        .and_then(extract_rich_text)
        .or_else(|| entry.text.clone())
        .unwrap_or_default()
}

/// Rich text document as embedded in the export. Only the text of each
/// fragment matters; attributes and embedded objects are ignored.
#[derive(Debug, Deserialize)]
struct RichTextDocument {
    #[serde(default)]
    contents: Vec<RichTextFragment>,
}

#[derive(Debug, Deserialize)]
struct RichTextFragment {
    #[serde(default)]
    text: Option<Value>,
}

/// Concatenate the text of every fragment. `None` when the document does not
/// decode or contains no text.
pub fn extract_rich_text(rich_text: &Value) -> Option<String> {
    let document: RichTextDocument = match rich_text {
        Value::String(encoded) => serde_json::from_str(encoded).ok()?,
        other => serde_json::from_value(other.clone()).ok()?,
    };

    let text: String = document
        .contents
        .iter()
        .filter_map(|fragment| fragment.text.as_ref().and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn section_heading(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "## Photos",
        MediaKind::Audio => "## Audio",
        MediaKind::Video => "## Videos",
    }
}

fn embed_line(reference: &MediaReference, index: usize) -> String {
    match reference.kind {
        MediaKind::Photo => format!("![Photo {}]({})", index + 1, reference.link_target()),
        MediaKind::Audio | MediaKind::Video => format!("![[{}]]", reference.link_target()),
    }
}

/// Whole numbers print without a fractional part (`0`, `21`), others as-is
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Escape for a double-quoted YAML scalar; line breaks become `\n` / `\r`
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
