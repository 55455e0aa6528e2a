use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{notes, timestamp, Record, RecordKind};

/// A garden bed. Activities are logged against it by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenBed {
    pub id: String,
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "notes::deserialize"
    )]
    pub notes: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// The fields a caller supplies when creating a bed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBed {
    pub name: String,
    pub notes: Option<String>,
}

impl NewBed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl GardenBed {
    /// Builds the stored form of a new bed: both timestamps set to `now`.
    pub fn create(bed: NewBed, id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: bed.name,
            notes: bed.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for GardenBed {
    const KIND: RecordKind = RecordKind::Bed;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn keep_identity(&mut self, prior: &Self) {
        self.id = prior.id.clone();
        self.created_at = prior.created_at;
    }
}

impl fmt::Display for GardenBed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count().max(1)))?;
        writeln!(f, "ID: {}", self.id)?;

        if let Some(notes) = &self.notes {
            writeln!(f, "Notes: {}", notes)?;
        }

        writeln!(f, "Created: {}", self.created_at.format("%Y-%m-%d %H:%M"))?;
        write!(f, "Updated: {}", self.updated_at.format("%Y-%m-%d %H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_create_sets_both_timestamps() {
        let bed = GardenBed::create(NewBed::new("Tomato Bed"), "42", now());

        assert_eq!(bed.id, "42");
        assert_eq!(bed.name, "Tomato Bed");
        assert!(bed.notes.is_none());
        assert_eq!(bed.created_at, now());
        assert_eq!(bed.updated_at, now());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let bed = GardenBed::create(
            NewBed::new("Herb Garden").with_notes("Partial shade"),
            "7",
            now(),
        );

        let json = serde_json::to_value(&bed).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["notes"], "Partial shade");
        assert_eq!(json["createdAt"], "2025-03-01T08:00:00.000Z");
        assert_eq!(json["updatedAt"], "2025-03-01T08:00:00.000Z");
    }

    #[test]
    fn test_json_without_notes_omits_field() {
        let bed = GardenBed::create(NewBed::new("Bare"), "1", now());
        let json = serde_json::to_value(&bed).unwrap();
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_empty_notes_read_as_none() {
        let bed: GardenBed = serde_json::from_str(
            r#"{"id":"1","name":"Bed","notes":"","createdAt":"2025-03-01T08:00:00.000Z","updatedAt":"2025-03-01T08:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(bed.notes.is_none());

        let bed: GardenBed = serde_json::from_str(
            r#"{"id":"1","name":"Bed","notes":null,"createdAt":"2025-03-01T08:00:00.000Z","updatedAt":"2025-03-01T08:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(bed.notes.is_none());
    }

    #[test]
    fn test_keep_identity() {
        let prior = GardenBed::create(NewBed::new("Old"), "1", now());
        let mut confirmed = GardenBed::create(NewBed::new("New"), "other", Utc::now());

        confirmed.keep_identity(&prior);
        assert_eq!(confirmed.id, "1");
        assert_eq!(confirmed.created_at, now());
        assert_eq!(confirmed.name, "New");
    }
}
