//! Day One export schema
//!
//! Reads the untyped export document into [`EntryRecord`]s. Every field is
//! optional here: a wrongly typed field reads as absent instead of failing,
//! so that a malformed entry is rejected later on its own and never takes
//! the whole document down with it.

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{ImportError, Result};

/// The kinds of media a Day One entry can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Audio,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Photo, MediaKind::Audio, MediaKind::Video];

    /// Extension used when the export does not declare one
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Audio => "m4a",
            MediaKind::Video => "mp4",
        }
    }

    /// Folder holding this kind of media inside a Day One export
    pub fn subfolder(self) -> &'static str {
        match self {
            MediaKind::Photo => "photos",
            MediaKind::Audio => "audios",
            MediaKind::Video => "videos",
        }
    }

    /// Key of the entry field listing this kind of media
    fn entry_key(self) -> &'static str {
        self.subfolder()
    }

    /// Key of the media item field declaring the extension
    fn extension_key(self) -> &'static str {
        match self {
            MediaKind::Audio => "format",
            MediaKind::Photo | MediaKind::Video => "type",
        }
    }
}

/// One media item referenced by an entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub identifier: String,
    /// Declared extension (`type` for photos and videos, `format` for audio)
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub place_name: Option<String>,
    pub locality_name: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub weather_code: Option<String>,
    pub temperature_celsius: Option<f64>,
}

/// One diary entry, with every field presence-checked
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub uuid: Option<String>,
    pub creation_date: Option<String>,
    pub modified_date: Option<String>,
    pub text: Option<String>,
    /// Embedded rich-text document, kept undecoded (a JSON string or object)
    pub rich_text: Option<Value>,
    /// `None` when the export has no tags array; `Some(vec![])` for an empty one
    pub tags: Option<Vec<String>>,
    pub location: Option<Location>,
    pub weather: Option<Weather>,
    pub starred: bool,
    pub is_pinned: bool,
    pub is_all_day: bool,
    pub photos: Vec<MediaItem>,
    pub audios: Vec<MediaItem>,
    pub videos: Vec<MediaItem>,
}

impl EntryRecord {
    /// Build a record from one element of the `entries` array.
    /// Non-object values produce an empty record.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let mut record = Self {
            uuid: text_field(obj, "uuid"),
            creation_date: text_field(obj, "creationDate"),
            modified_date: text_field(obj, "modifiedDate"),
            text: obj.get("text").and_then(Value::as_str).map(str::to_string),
            rich_text: obj
                .get("richText")
                .filter(|v| truthy(v))
                .cloned(),
            tags: obj.get("tags").and_then(Value::as_array).map(|items| {
                items.iter().filter_map(scalar_to_string).collect()
            }),
            location: obj.get("location").and_then(Value::as_object).map(read_location),
            weather: obj.get("weather").and_then(Value::as_object).map(read_weather),
            starred: obj.get("starred").is_some_and(truthy),
            is_pinned: obj.get("isPinned").is_some_and(truthy),
            is_all_day: obj.get("isAllDay").is_some_and(truthy),
            ..Self::default()
        };

        for kind in MediaKind::ALL {
            let items = read_media(obj, kind);
            match kind {
                MediaKind::Photo => record.photos = items,
                MediaKind::Audio => record.audios = items,
                MediaKind::Video => record.videos = items,
            }
        }

        record
    }

    pub fn media(&self, kind: MediaKind) -> &[MediaItem] {
        match kind {
            MediaKind::Photo => &self.photos,
            MediaKind::Audio => &self.audios,
            MediaKind::Video => &self.videos,
        }
    }
}

/// The top-level export document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportDocument {
    pub entries: Vec<EntryRecord>,
}

impl ImportDocument {
    /// Parse export text. Unparseable JSON is the one fatal input error.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ImportError::InvalidDocument(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            entries: read_entries(value),
        }
    }
}

/// Read the `entries` array of an export.
/// A missing or non-array `entries` field is an empty export, not an error.
pub fn read_entries(value: &Value) -> Vec<EntryRecord> {
    value
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(EntryRecord::from_value).collect())
        .unwrap_or_default()
}

/// Truthiness as the export format's producers use it: `false`, `0`, `""`
/// and `null` are false, everything else is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A non-empty string field
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn read_location(obj: &Map<String, Value>) -> Location {
    Location {
        place_name: text_field(obj, "placeName"),
        locality_name: text_field(obj, "localityName"),
        country: text_field(obj, "country"),
        latitude: number_field(obj, "latitude"),
        longitude: number_field(obj, "longitude"),
    }
}

fn read_weather(obj: &Map<String, Value>) -> Weather {
    Weather {
        weather_code: text_field(obj, "weatherCode"),
        temperature_celsius: number_field(obj, "temperatureCelsius"),
    }
}

/// Whether `name` can be used as a single file name component.
/// Separators, `.`/`..` and drive prefixes are refused.
pub fn is_plain_file_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':', '\0'])
}

/// Media items are dropped when they have no identifier, or when the
/// identifier or extension would not stay a single file name on disk
fn read_media(obj: &Map<String, Value>, kind: MediaKind) -> Vec<MediaItem> {
    let Some(items) = obj.get(kind.entry_key()).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let item = item.as_object()?;
            let Some(identifier) = text_field(item, "identifier") else {
                log::debug!("Dropping {:?} without identifier", kind);
                return None;
            };
            let extension = text_field(item, kind.extension_key());

            let extension_ok = extension.as_deref().map_or(true, is_plain_file_component);
            if !is_plain_file_component(&identifier) || !extension_ok {
                log::warn!(
                    "Dropping {:?} with unusable file name {:?} / {:?}",
                    kind,
                    identifier,
                    extension
                );
                return None;
            }

            Some(MediaItem { identifier, extension })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_or_malformed_entries_is_empty() {
        assert!(read_entries(&json!({})).is_empty());
        assert!(read_entries(&json!({ "entries": "nope" })).is_empty());
        assert!(read_entries(&json!({ "entries": { "a": 1 } })).is_empty());
        assert!(read_entries(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(
            ImportDocument::parse("{ not json"),
            Err(ImportError::InvalidDocument(_))
        ));
        assert_eq!(ImportDocument::parse("{}").unwrap().entries.len(), 0);
    }

    #[test]
    fn test_full_entry() {
        let value = json!({
            "uuid": "ABC",
            "creationDate": "2023-05-01T10:15:30Z",
            "modifiedDate": "2023-05-02T08:00:00Z",
            "text": "Hello",
            "tags": ["a", "b", 3],
            "starred": true,
            "isPinned": 1,
            "isAllDay": false,
            "location": {
                "placeName": "Cafe",
                "localityName": "Lisbon",
                "country": "",
                "latitude": 38.7,
                "longitude": -9.1
            },
            "weather": { "weatherCode": "clear", "temperatureCelsius": 0 },
            "photos": [{ "identifier": "P1", "type": "jpeg" }, { "type": "png" }],
            "audios": [{ "identifier": "A1", "format": "aac" }],
            "videos": [{ "identifier": "V1" }]
        });

        let entry = EntryRecord::from_value(&value);

        assert_eq!(entry.uuid.as_deref(), Some("ABC"));
        assert_eq!(entry.text.as_deref(), Some("Hello"));
        assert_eq!(entry.tags, Some(vec!["a".to_string(), "b".to_string(), "3".to_string()]));
        assert!(entry.starred);
        assert!(entry.is_pinned);
        assert!(!entry.is_all_day);

        let location = entry.location.unwrap();
        assert_eq!(location.place_name.as_deref(), Some("Cafe"));
        assert_eq!(location.country, None);
        assert_eq!(location.longitude, Some(-9.1));

        let weather = entry.weather.unwrap();
        assert_eq!(weather.temperature_celsius, Some(0.0));

        assert_eq!(entry.photos.len(), 1);
        assert_eq!(entry.photos[0].extension.as_deref(), Some("jpeg"));
        assert_eq!(entry.audios[0].extension.as_deref(), Some("aac"));
        assert_eq!(entry.videos[0].extension, None);
    }

    #[test]
    fn test_wrongly_typed_fields_read_as_absent() {
        let entry = EntryRecord::from_value(&json!({
            "uuid": 42,
            "creationDate": "",
            "text": ["x"],
            "tags": "a,b",
            "location": "Lisbon",
            "photos": {}
        }));

        assert_eq!(entry.uuid, None);
        assert_eq!(entry.creation_date, None);
        assert_eq!(entry.text, None);
        assert_eq!(entry.tags, None);
        assert_eq!(entry.location, None);
        assert!(entry.photos.is_empty());
    }

    #[test]
    fn test_media_names_must_stay_in_folder() {
        let entry = EntryRecord::from_value(&json!({
            "photos": [
                { "identifier": "/etc/passwd", "type": "jpg" },
                { "identifier": "..", "type": "jpg" },
                { "identifier": "../../secret", "type": "key" },
                { "identifier": "P1", "type": "../key" },
                { "identifier": "C:evil" },
                { "identifier": "a\\b" },
                { "identifier": "P2", "type": "png" }
            ]
        }));

        assert_eq!(entry.photos.len(), 1);
        assert_eq!(entry.photos[0].identifier, "P2");
    }

    #[test]
    fn test_is_plain_file_component() {
        assert!(is_plain_file_component("5F3A9C0E"));
        assert!(is_plain_file_component("photo.v2"));
        assert!(!is_plain_file_component(""));
        assert!(!is_plain_file_component(".."));
        assert!(!is_plain_file_component("/abs"));
        assert!(!is_plain_file_component("dir/file"));
    }

    #[test]
    fn test_non_object_entry_is_empty_record() {
        let doc = ImportDocument::from_value(&json!({ "entries": [null, "x", { "uuid": "u" }] }));

        assert_eq!(doc.entries.len(), 3);
        assert_eq!(doc.entries[0], EntryRecord::default());
        assert_eq!(doc.entries[2].uuid.as_deref(), Some("u"));
    }
}
