//! Gardenlog Core Library
//!
//! Garden beds and the activities logged against them, kept in a remote
//! spreadsheet and cached in memory for the front end.

pub mod config;
pub mod garden;
pub mod models;
pub mod store;

pub use config::{
    Backend, ConfigError, ConfigSource, ConfigValue, FileSettings, MemorySettings, RestConfig,
    SettingKey, SettingsStore, SheetsConfig,
};
pub use garden::{Action, ErrorNotice, Garden, GardenError, LoadState, ERROR_DISPLAY_DURATION};
pub use models::{ActivityType, GardenActivity, GardenBed, NewActivity, NewBed, Record, RecordKind};
pub use store::{connect, RemoteStore, SheetRestStore, SheetsValuesStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
