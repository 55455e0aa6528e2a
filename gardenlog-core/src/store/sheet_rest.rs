//! Store backed by a sheet-to-REST proxy.
//!
//! Each tab is a JSON collection at its own URL. Rows are addressed by
//! field: `GET {url}/bedId/{id}` filters, `PUT {url}/id/{id}` updates.
//! The proxy's response to a write is the stored row and wins over what
//! was sent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::error::{Operation, StoreError, Verb};
use super::http::{read_json, send};
use super::RemoteStore;
use crate::config::{Backend, RestConfig, SettingsStore};
use crate::models::{
    new_record_id, timestamp, GardenActivity, GardenBed, NewActivity, NewBed, Record, RecordKind,
};

/// Proxies answer writes with either the row or a list of affected rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(records) => records.into_iter().next(),
            OneOrMany::One(record) => Some(record),
        }
    }
}

pub struct SheetRestStore {
    client: Client,
    settings: Arc<dyn SettingsStore>,
}

impl SheetRestStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Collection URL for a record kind, read fresh from settings.
    fn collection_url(&self, kind: RecordKind) -> Result<String, StoreError> {
        let config = RestConfig::read(self.settings.as_ref())?;
        if !config.is_configured() {
            return Err(StoreError::NotConfigured);
        }
        let url = match kind {
            RecordKind::Bed => config.beds_url,
            RecordKind::Activity => config.activities_url,
        };
        Ok(url.trim_end_matches('/').to_string())
    }

    fn keyed_url(&self, kind: RecordKind, field: &str, value: &str) -> Result<String, StoreError> {
        Ok(format!(
            "{}/{}/{}",
            self.collection_url(kind)?,
            field,
            urlencoding::encode(value)
        ))
    }

    async fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        let operation = Operation::new(Verb::List, T::KIND);
        let url = self.collection_url(T::KIND)?;

        tracing::debug!("GET {}", url);
        let response = send(operation, self.client.get(&url)).await?;
        read_json(operation, response).await
    }

    async fn filter<T: Record>(
        &self,
        verb: Verb,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, StoreError> {
        let operation = Operation::new(verb, T::KIND);
        let url = self.keyed_url(T::KIND, field, value)?;

        tracing::debug!("GET {}", url);
        let response = send(operation, self.client.get(&url)).await?;
        read_json(operation, response).await
    }

    async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        let records: Vec<T> = self.filter(Verb::Get, "id", id).await?;
        Ok(records.into_iter().next())
    }

    async fn create<T: Record>(&self, record: T) -> Result<T, StoreError> {
        let operation = Operation::new(Verb::Create, T::KIND);
        let url = self.collection_url(T::KIND)?;

        tracing::debug!("POST {}", url);
        let response = send(operation, self.client.post(&url).json(&record)).await?;
        let stored: OneOrMany<T> = read_json(operation, response).await?;
        stored
            .into_first()
            .ok_or_else(|| StoreError::decode(operation, "proxy returned no stored row"))
    }

    async fn update<T: Record>(&self, mut record: T) -> Result<T, StoreError> {
        let operation = Operation::new(Verb::Update, T::KIND);
        let url = self.keyed_url(T::KIND, "id", record.id())?;

        record.touch(timestamp::now());

        tracing::debug!("PUT {}", url);
        let response = send(operation, self.client.put(&url).json(&record)).await?;
        let stored: OneOrMany<T> = read_json(operation, response).await?;
        stored
            .into_first()
            .ok_or_else(|| StoreError::not_found(operation, record.id()))
    }

    async fn delete<T: Record>(&self, id: &str) -> Result<(), StoreError> {
        let operation = Operation::new(Verb::Delete, T::KIND);
        let url = self.keyed_url(T::KIND, "id", id)?;

        tracing::debug!("DELETE {}", url);
        send(operation, self.client.delete(&url)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SheetRestStore {
    fn backend(&self) -> Backend {
        Backend::SheetRest
    }

    async fn list_beds(&self) -> Result<Vec<GardenBed>, StoreError> {
        self.list().await
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
        self.list().await
    }

    async fn get_activity(&self, id: &str) -> Result<Option<GardenActivity>, StoreError> {
        self.get(id).await
    }

    async fn activities_for_bed(&self, bed_id: &str) -> Result<Vec<GardenActivity>, StoreError> {
        self.filter(Verb::Filter, "bedId", bed_id).await
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
