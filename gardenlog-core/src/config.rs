//! Persisted settings and the typed views the stores read from them.
//!
//! Settings are plain string values under fixed keys. Stores never cache
//! them: each remote call reads its view afresh, so `garden config set`
//! takes effect on the next request.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Prefix for environment overrides, e.g. `GARDENLOG_SPREADSHEET_ID`.
pub const ENV_PREFIX: &str = "GARDENLOG_";

/// A named setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    GoogleApiKey,
    SpreadsheetId,
    BedSheetName,
    ActivitySheetName,
    BedsApiUrl,
    ActivitiesApiUrl,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::GoogleApiKey,
        SettingKey::SpreadsheetId,
        SettingKey::BedSheetName,
        SettingKey::ActivitySheetName,
        SettingKey::BedsApiUrl,
        SettingKey::ActivitiesApiUrl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::GoogleApiKey => "GOOGLE_API_KEY",
            SettingKey::SpreadsheetId => "SPREADSHEET_ID",
            SettingKey::BedSheetName => "BED_SHEET_NAME",
            SettingKey::ActivitySheetName => "ACTIVITY_SHEET_NAME",
            SettingKey::BedsApiUrl => "BEDS_API_URL",
            SettingKey::ActivitiesApiUrl => "ACTIVITIES_API_URL",
        }
    }

    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            SettingKey::BedSheetName => Some("Beds"),
            SettingKey::ActivitySheetName => Some("Activities"),
            _ => None,
        }
    }

    pub fn env_var(&self) -> String {
        format!("{}{}", ENV_PREFIX, self.as_str())
    }

    /// Whether the value should be masked when displayed.
    pub fn is_secret(&self) -> bool {
        matches!(self, SettingKey::GoogleApiKey)
    }

    /// Checks a value before it is stored.
    pub fn validate(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("{} cannot be empty", self));
        }
        match self {
            SettingKey::BedsApiUrl | SettingKey::ActivitiesApiUrl => {
                if value.starts_with("http://") || value.starts_with("https://") {
                    Ok(())
                } else {
                    Err(format!("{} must be an http:// or https:// URL", self))
                }
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<_> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
                format!(
                    "Unknown setting '{}'. Valid keys: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

/// Source of a configuration value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to write settings file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Get/set access to persisted settings.
///
/// Values are returned as stored; empty strings count as unset. Defaults
/// are applied by the typed views, not here.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: SettingKey) -> Result<Option<String>, ConfigError>;

    fn set(&self, key: SettingKey, value: &str) -> Result<(), ConfigError>;

    fn unset(&self, key: SettingKey) -> Result<(), ConfigError>;
}

/// Settings kept in a YAML file, with environment overrides.
///
/// The file is read on every lookup.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings at the platform default location.
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Default settings directory (platform-specific):
    /// - Linux: ~/.config/gardenlog/
    /// - macOS: ~/Library/Application Support/gardenlog/
    /// - Windows: %APPDATA%/gardenlog/
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gardenlog")
    }

    pub fn default_path() -> PathBuf {
        Self::default_dir().join("settings.yaml")
    }

    /// Resolves a key with priority: env var > file > default.
    pub fn resolve(&self, key: SettingKey) -> Result<Option<ConfigValue<String>>, ConfigError> {
        if let Some(value) = non_empty(std::env::var(key.env_var()).ok()) {
            return Ok(Some(ConfigValue::new(value, ConfigSource::Environment)));
        }
        if let Some(value) = non_empty(self.load()?.remove(key.as_str())) {
            return Ok(Some(ConfigValue::new(value, ConfigSource::File)));
        }
        Ok(key
            .default_value()
            .map(|value| ConfigValue::new(value.to_string(), ConfigSource::Default)))
    }

    fn load(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_yaml::to_string(values)?;
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: SettingKey) -> Result<Option<String>, ConfigError> {
        Ok(self
            .resolve(key)?
            .filter(|v| v.source != ConfigSource::Default)
            .map(|v| v.value))
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<(), ConfigError> {
        let mut values = self.load()?;
        values.insert(key.as_str().to_string(), value.trim().to_string());
        self.save(&values)
    }

    fn unset(&self, key: SettingKey) -> Result<(), ConfigError> {
        let mut values = self.load()?;
        if values.remove(key.as_str()).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

/// In-process settings, used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<SettingKey, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: SettingKey, value: impl Into<String>) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.into());
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: SettingKey) -> Result<Option<String>, ConfigError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(non_empty(values.get(&key).cloned()))
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<(), ConfigError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_string());
        Ok(())
    }

    fn unset(&self, key: SettingKey) -> Result<(), ConfigError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn get_or_default(settings: &dyn SettingsStore, key: SettingKey) -> Result<String, ConfigError> {
    Ok(settings
        .get(key)?
        .or_else(|| key.default_value().map(str::to_string))
        .unwrap_or_default())
}

/// Settings for the spreadsheet values API.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetsConfig {
    pub api_key: String,
    pub spreadsheet_id: String,
    pub bed_sheet_name: String,
    pub activity_sheet_name: String,
}

impl SheetsConfig {
    pub fn read(settings: &dyn SettingsStore) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_or_default(settings, SettingKey::GoogleApiKey)?,
            spreadsheet_id: get_or_default(settings, SettingKey::SpreadsheetId)?,
            bed_sheet_name: get_or_default(settings, SettingKey::BedSheetName)?,
            activity_sheet_name: get_or_default(settings, SettingKey::ActivitySheetName)?,
        })
    }

    /// Configured iff both the API key and the spreadsheet id are set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.spreadsheet_id.is_empty()
    }
}

/// Settings for the sheet-to-REST proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct RestConfig {
    pub beds_url: String,
    pub activities_url: String,
}

impl RestConfig {
    pub fn read(settings: &dyn SettingsStore) -> Result<Self, ConfigError> {
        Ok(Self {
            beds_url: get_or_default(settings, SettingKey::BedsApiUrl)?,
            activities_url: get_or_default(settings, SettingKey::ActivitiesApiUrl)?,
        })
    }

    /// Configured iff both collection URLs are set.
    pub fn is_configured(&self) -> bool {
        !self.beds_url.is_empty() && !self.activities_url.is_empty()
    }
}

/// Which remote store variant is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Spreadsheet values API, addressed by sheet name and cell range.
    SheetsValues,
    /// Sheet-to-REST proxy with one endpoint per collection.
    SheetRest,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::SheetsValues => write!(f, "spreadsheet values API"),
            Backend::SheetRest => write!(f, "sheet REST proxy"),
        }
    }
}

impl Backend {
    /// Picks the variant whose keys are present. The values API wins when
    /// both are configured.
    pub fn select(settings: &dyn SettingsStore) -> Result<Option<Backend>, ConfigError> {
        if SheetsConfig::read(settings)?.is_configured() {
            return Ok(Some(Backend::SheetsValues));
        }
        if RestConfig::read(settings)?.is_configured() {
            return Ok(Some(Backend::SheetRest));
        }
        Ok(None)
    }
}
