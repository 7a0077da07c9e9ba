//! Import configuration and its persistence
//!
//! The configuration is loaded once at startup, merged over the defaults,
//! and written back whenever a setting changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// What to do when a note already exists at an entry's computed path
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Leave the existing note alone and count the entry as skipped
    #[default]
    Skip,
    /// Record the entry as failed
    Fail,
}

/// Settings that shape how entries are converted and where they land
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfiguration {
    /// Destination folder inside the store
    pub import_folder: String,
    /// Reserved. Filenames always use `YYYY-MM-DD`.
    pub date_format: String,
    /// Name notes after the entry UUID instead of its creation time
    pub use_uuid_filenames: bool,
    pub include_weather: bool,
    pub include_location: bool,
    pub include_tags: bool,
    pub on_duplicate: DuplicatePolicy,
}

impl Default for ImportConfiguration {
    fn default() -> Self {
        Self {
            import_folder: "Day One Import".to_string(),
            date_format: "YYYY-MM-DD".to_string(),
            use_uuid_filenames: false,
            include_weather: true,
            include_location: true,
            include_tags: true,
            on_duplicate: DuplicatePolicy::Skip,
        }
    }
}

impl ImportConfiguration {
    /// Set one field by its persisted (camelCase) name
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "importFolder" => {
                let folder = value.trim().trim_matches('/');
                if folder.is_empty() {
                    return Err(invalid());
                }
                self.import_folder = folder.to_string();
            }
            "dateFormat" => self.date_format = value.to_string(),
            "useUuidFilenames" => self.use_uuid_filenames = parse_bool(value).ok_or_else(invalid)?,
            "includeWeather" => self.include_weather = parse_bool(value).ok_or_else(invalid)?,
            "includeLocation" => self.include_location = parse_bool(value).ok_or_else(invalid)?,
            "includeTags" => self.include_tags = parse_bool(value).ok_or_else(invalid)?,
            "onDuplicate" => {
                self.on_duplicate = match value.to_lowercase().as_str() {
                    "skip" => DuplicatePolicy::Skip,
                    "fail" => DuplicatePolicy::Fail,
                    _ => return Err(invalid()),
                }
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Loads and saves [`ImportConfiguration`] as JSON in a config directory
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The default config directory: `$DAYONE_CONFIG_DIR`, else `<config dir>/dayone`
    pub fn default_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("DAYONE_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }

        dirs::config_dir()
            .map(|p| p.join("dayone"))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Load the saved configuration merged over the defaults.
    /// A missing settings file yields the defaults.
    pub fn load(&self) -> Result<ImportConfiguration> {
        let path = self.settings_path();

        if !path.exists() {
            return Ok(ImportConfiguration::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: ImportConfiguration = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, config: &ImportConfiguration) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(config)?;
        atomic_write(&self.settings_path(), json.as_bytes())?;
        Ok(())
    }

    /// Change one setting and persist the result immediately
    pub fn update(&self, key: &str, value: &str) -> Result<ImportConfiguration> {
        let mut config = self.load()?;
        config.set(key, value)?;
        self.save(&config)?;
        log::info!("Updated setting {} = {}", key, value);
        Ok(config)
    }
}

/// Write to a temporary sibling, then rename over the target
fn atomic_write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(tmp_path, path)
}
