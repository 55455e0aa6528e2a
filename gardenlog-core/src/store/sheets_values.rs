//! Store backed by the spreadsheet values API.
//!
//! Every request is authenticated with `?key=<GOOGLE_API_KEY>` and
//! addressed by an A1 range such as `Beds!A5:E5`. The header row of each
//! tab decides the column order of everything written to it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::error::{Operation, StoreError, Verb};
use super::http::{read_json, send};
use super::layout::{column_letter, decode_grid, locate_row, RowLayout, SheetRecord};
use super::RemoteStore;
use crate::config::{Backend, SettingsStore, SheetsConfig};
use crate::models::{
    new_record_id, timestamp, GardenActivity, GardenBed, NewActivity, NewBed, Record, RecordKind,
};

/// Production endpoint of the values API.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Body of a values GET. Google omits `values` for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsValuesStore {
    client: Client,
    settings: Arc<dyn SettingsStore>,
    base_url: String,
}

impl SheetsValuesStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self::with_base_url(settings, DEFAULT_BASE_URL)
    }

    /// Points the store at a different API root (used by tests).
    pub fn with_base_url(settings: Arc<dyn SettingsStore>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            settings,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn config(&self) -> Result<SheetsConfig, StoreError> {
        let config = SheetsConfig::read(self.settings.as_ref())?;
        if !config.is_configured() {
            return Err(StoreError::NotConfigured);
        }
        Ok(config)
    }

    fn range_url(&self, config: &SheetsConfig, range: &str, action: Option<&str>) -> String {
        let mut url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&config.spreadsheet_id),
            urlencoding::encode(range)
        );
        if let Some(action) = action {
            url.push(':');
            url.push_str(action);
        }
        url
    }

    async fn fetch_grid(
        &self,
        operation: Operation,
        config: &SheetsConfig,
        range: &str,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        tracing::debug!("GET values {}", range);
        let request = self
            .client
            .get(self.range_url(config, range, None))
            .query(&[("key", config.api_key.as_str())]);
        let response = send(operation, request).await?;
        let body: ValueRange = read_json(operation, response).await?;
        Ok(body.values)
    }

    async fn list<T: Record + SheetRecord>(&self, verb: Verb) -> Result<Vec<T>, StoreError> {
        let operation = Operation::new(verb, T::KIND);
        let config = self.config()?;
        let sheet = sheet_name(&config, T::KIND);

        let grid = self.fetch_grid(operation, &config, sheet).await?;
        decode_grid(&grid).map_err(|e| StoreError::decode(operation, format!("{} {}", sheet, e)))
    }

    async fn get<T: Record + SheetRecord>(&self, id: &str) -> Result<Option<T>, StoreError> {
        let records: Vec<T> = self.list(Verb::Get).await?;
        Ok(records.into_iter().find(|r| r.id() == id))
    }

    async fn create<T: Record + SheetRecord>(&self, record: T) -> Result<T, StoreError> {
        let operation = Operation::new(Verb::Create, T::KIND);
        let config = self.config()?;
        let sheet = sheet_name(&config, T::KIND);

        let header_range = format!("{}!1:1", sheet);
        let headers = self
            .fetch_grid(operation, &config, &header_range)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();
        if headers.is_empty() {
            return Err(StoreError::decode(
                operation,
                format!("sheet '{}' has no header row", sheet),
            ));
        }

        let layout = RowLayout::<T>::new(&headers);
        let missing = layout.missing_columns();
        if !missing.is_empty() {
            tracing::warn!(
                "Sheet '{}' has no column for {}; those fields will not be stored",
                sheet,
                missing.join(", ")
            );
        }

        let range = format!("{}!A:{}", sheet, column_letter(layout.width()));
        tracing::debug!("APPEND {}", range);
        let request = self
            .client
            .post(self.range_url(&config, &range, Some("append")))
            .query(&[
                ("valueInputOption", "RAW"),
                ("key", config.api_key.as_str()),
            ])
            .json(&serde_json::json!({ "values": [layout.encode(&record)] }));
        send(operation, request).await?;

        Ok(record)
    }

    async fn update<T: Record + SheetRecord>(&self, mut record: T) -> Result<T, StoreError> {
        let operation = Operation::new(Verb::Update, T::KIND);
        let config = self.config()?;
        let sheet = sheet_name(&config, T::KIND);

        let grid = self.fetch_grid(operation, &config, sheet).await?;
        let row = locate_row::<T>(&grid, record.id())
            .ok_or_else(|| StoreError::not_found(operation, record.id()))?;
        let headers = grid.first().map(Vec::as_slice).unwrap_or_default();
        let layout = RowLayout::<T>::new(headers);

        record.touch(timestamp::now());

        let last = column_letter(layout.width());
        let range = format!("{}!A{}:{}{}", sheet, row, last, row);
        tracing::debug!("PUT {}", range);
        let request = self
            .client
            .put(self.range_url(&config, &range, None))
            .query(&[
                ("valueInputOption", "RAW"),
                ("key", config.api_key.as_str()),
            ])
            .json(&serde_json::json!({ "values": [layout.encode(&record)] }));
        send(operation, request).await?;

        Ok(record)
    }

    /// Blanks the record's row. The row itself stays, so later rows keep
    /// their numbers.
    async fn delete<T: Record + SheetRecord>(&self, id: &str) -> Result<(), StoreError> {
        let operation = Operation::new(Verb::Delete, T::KIND);
        let config = self.config()?;
        let sheet = sheet_name(&config, T::KIND);

        let grid = self.fetch_grid(operation, &config, sheet).await?;
        let row =
            locate_row::<T>(&grid, id).ok_or_else(|| StoreError::not_found(operation, id))?;
        let width = grid.first().map(Vec::len).unwrap_or(1).max(1);

        let last = column_letter(width);
        let range = format!("{}!A{}:{}{}", sheet, row, last, row);
        tracing::debug!("CLEAR {}", range);
        let request = self
            .client
            .post(self.range_url(&config, &range, Some("clear")))
            .query(&[("key", config.api_key.as_str())])
            .json(&serde_json::json!({}));
        send(operation, request).await?;

        Ok(())
    }
}

fn sheet_name(config: &SheetsConfig, kind: RecordKind) -> &str {
    match kind {
        RecordKind::Bed => &config.bed_sheet_name,
        RecordKind::Activity => &config.activity_sheet_name,
    }
}

#[async_trait]
impl RemoteStore for SheetsValuesStore {
    fn backend(&self) -> Backend {
        Backend::SheetsValues
    }

    async fn list_beds(&self) -> Result<Vec<GardenBed>, StoreError> {
        self.list(Verb::List).await
    }

    async fn get_bed(&self, id: &str) -> Result<Option<GardenBed>, StoreError> {
        self.get(id).await
    }

    async fn create_bed(&self, bed: NewBed) -> Result<GardenBed, StoreError> {
        self.create(GardenBed::create(bed, new_record_id(), timestamp::now()))
            .await
    }

    async fn update_bed(&self, bed: GardenBed) -> Result<GardenBed, StoreError> {
        self.update(bed).await
    }

    async fn delete_bed(&self, id: &str) -> Result<(), StoreError> {
        self.delete::<GardenBed>(id).await
    }

    async fn list_activities(&self) -> Result<Vec<GardenActivity>, StoreError> {
        self.list(Verb::List).await
    }

    async fn get_activity(&self, id: &str) -> Result<Option<GardenActivity>, StoreError> {
        self.get(id).await
    }

    async fn activities_for_bed(&self, bed_id: &str) -> Result<Vec<GardenActivity>, StoreError> {
        let activities: Vec<GardenActivity> = self.list(Verb::Filter).await?;
        Ok(activities
            .into_iter()
            .filter(|a| a.bed_id == bed_id)
            .collect())
    }

    async fn create_activity(&self, activity: NewActivity) -> Result<GardenActivity, StoreError> {
        self.create(GardenActivity::create(activity, new_record_id(), timestamp::now()))
            .await
    }

    async fn update_activity(
        &self,
        activity: GardenActivity,
    ) -> Result<GardenActivity, StoreError> {
        self.update(activity).await
    }

    async fn delete_activity(&self, id: &str) -> Result<(), StoreError> {
        self.delete::<GardenActivity>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemorySettings, SettingKey};

    fn store() -> SheetsValuesStore {
        let settings = MemorySettings::new()
            .with(SettingKey::GoogleApiKey, "k")
            .with(SettingKey::SpreadsheetId, "sheet/1");
        SheetsValuesStore::with_base_url(Arc::new(settings), "http://localhost:1/v4/")
    }

    #[test]
    fn test_range_url_encodes_range() {
        let store = store();
        let config = store.config().unwrap();

        assert_eq!(
            store.range_url(&config, "Raised Beds!A2:E2", None),
            "http://localhost:1/v4/spreadsheets/sheet%2F1/values/Raised%20Beds%21A2%3AE2"
        );
        assert_eq!(
            store.range_url(&config, "Beds!A:E", Some("append")),
            "http://localhost:1/v4/spreadsheets/sheet%2F1/values/Beds%21A%3AE:append"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails_before_network() {
        let store = SheetsValuesStore::new(Arc::new(MemorySettings::new()));
        let result = store.list_beds().await;
        assert!(matches!(result, Err(StoreError::NotConfigured)));
    }
}
