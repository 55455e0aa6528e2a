mod activity;
mod bed;
mod config_cmd;

use clap::ValueEnum;
use std::sync::Arc;

use gardenlog_core::{store, FileSettings, Garden, GardenError, SettingKey, StoreError};

pub use activity::ActivityCommand;
pub use bed::BedCommand;
pub use config_cmd::ConfigCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Connects to the configured spreadsheet and loads the garden.
///
/// A failed load is not fatal: the cache keeps whatever it could get (or
/// the built-in records) and the notice is printed as a warning.
pub async fn open_garden(settings: &FileSettings) -> Result<Garden, Box<dyn std::error::Error>> {
    let store = match store::connect(Arc::new(settings.clone())) {
        Ok(store) => store,
        Err(StoreError::NotConfigured) => return Err(not_configured(settings).into()),
        Err(e) => return Err(e.into()),
    };

    let garden = Garden::new(store);
    tracing::debug!("Loading garden from {}", garden.backend());
    if let Err(e) = garden.refresh().await {
        eprintln!("Warning: {}", describe(&e));
    }
    Ok(garden)
}

fn not_configured(settings: &FileSettings) -> String {
    format!(
        "No spreadsheet configured.\n\
         Set {} and {}, or {} and {}, with `garden config set KEY VALUE`.\n\
         Settings file: {}",
        SettingKey::GoogleApiKey,
        SettingKey::SpreadsheetId,
        SettingKey::BedsApiUrl,
        SettingKey::ActivitiesApiUrl,
        settings.path().display()
    )
}

/// Banner text followed by the underlying store error.
pub fn describe(e: &GardenError) -> String {
    format!("{} ({})", e, e.store_error())
}

/// Trims free text, treating blank input as "no value".
pub fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
