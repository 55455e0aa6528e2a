use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::activity_type::ActivityType;
use super::{notes, timestamp, Record, RecordKind};

/// Something done in a bed on a given date.
///
/// `date` is when the work happened and is chosen by the user; it is
/// unrelated to `created_at`, which records when the entry was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenActivity {
    pub id: String,
    pub bed_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,
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

/// The fields a caller supplies when logging an activity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub bed_id: String,
    pub activity_type: ActivityType,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl NewActivity {
    pub fn new(bed_id: impl Into<String>, activity_type: ActivityType, date: DateTime<Utc>) -> Self {
        Self {
            bed_id: bed_id.into(),
            activity_type,
            date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl GardenActivity {
    pub fn create(activity: NewActivity, id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            bed_id: activity.bed_id,
            activity_type: activity.activity_type,
            date: activity.date,
            notes: activity.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for GardenActivity {
    const KIND: RecordKind = RecordKind::Activity;

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

impl fmt::Display for GardenActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:<9}  {}",
            self.date.format("%Y-%m-%d"),
            self.activity_type,
            self.id
        )?;
        if let Some(notes) = &self.notes {
            write!(f, "\n    {}", notes)?;
        }
        Ok(())
    }
}
