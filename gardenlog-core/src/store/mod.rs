//! Remote stores for beds and activities.
//!
//! A [`RemoteStore`] translates record operations into HTTP calls against a
//! spreadsheet. Two variants exist:
//!
//! - [`SheetsValuesStore`]: the spreadsheet values API. Rows are positional
//!   and keyed by the header row; deletes blank the row.
//! - [`SheetRestStore`]: a sheet-to-REST proxy exposing each tab as a JSON
//!   collection with `/{field}/{value}` sub-paths.
//!
//! Stores keep no state between calls. Settings are read on every call.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use gardenlog_core::config::FileSettings;
//! use gardenlog_core::store;
//!
//! # async fn run() -> Result<(), gardenlog_core::store::StoreError> {
//! let settings = Arc::new(FileSettings::open_default());
//! let store = store::connect(settings)?;
//! let beds = store.list_beds().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod http;
pub mod layout;
mod sheet_rest;
mod sheets_values;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Backend, SettingsStore};
use crate::models::{GardenActivity, GardenBed, NewActivity, NewBed};

pub use error::{Operation, StoreError, TransportError, Verb};
pub use sheet_rest::SheetRestStore;
pub use sheets_values::{SheetsValuesStore, DEFAULT_BASE_URL};

/// CRUD access to the remote spreadsheet.
///
/// Creates assign the id and both timestamps; updates refresh
/// `updated_at`. Missing records are `Ok(None)` for reads and
/// `StoreError::NotFound` for updates and deletes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Which variant this is.
    fn backend(&self) -> Backend;

    async fn list_beds(&self) -> Result<Vec<GardenBed>, StoreError>;

    async fn get_bed(&self, id: &str) -> Result<Option<GardenBed>, StoreError>;

    async fn create_bed(&self, bed: NewBed) -> Result<GardenBed, StoreError>;

    async fn update_bed(&self, bed: GardenBed) -> Result<GardenBed, StoreError>;

    async fn delete_bed(&self, id: &str) -> Result<(), StoreError>;

    async fn list_activities(&self) -> Result<Vec<GardenActivity>, StoreError>;

    async fn get_activity(&self, id: &str) -> Result<Option<GardenActivity>, StoreError>;

    /// Activities logged against one bed. No match is an empty list.
    async fn activities_for_bed(&self, bed_id: &str) -> Result<Vec<GardenActivity>, StoreError>;

    async fn create_activity(&self, activity: NewActivity) -> Result<GardenActivity, StoreError>;

    async fn update_activity(&self, activity: GardenActivity)
        -> Result<GardenActivity, StoreError>;

    async fn delete_activity(&self, id: &str) -> Result<(), StoreError>;
}

/// Builds the store for whichever variant the settings configure.
///
/// Returns `StoreError::NotConfigured` when neither is.
pub fn connect(settings: Arc<dyn SettingsStore>) -> Result<Arc<dyn RemoteStore>, StoreError> {
    match Backend::select(settings.as_ref())? {
        Some(Backend::SheetsValues) => {
            tracing::debug!("Using {}", Backend::SheetsValues);
            Ok(Arc::new(SheetsValuesStore::new(settings)))
        }
        Some(Backend::SheetRest) => {
            tracing::debug!("Using {}", Backend::SheetRest);
            Ok(Arc::new(SheetRestStore::new(settings)))
        }
        None => Err(StoreError::NotConfigured),
    }
}
