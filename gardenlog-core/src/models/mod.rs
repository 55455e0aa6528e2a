mod activity;
mod activity_type;
mod bed;
mod record_id;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

pub use activity::{GardenActivity, NewActivity};
pub use activity_type::ActivityType;
pub use bed::{GardenBed, NewBed};
pub use record_id::new_record_id;

/// The two record collections kept in the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Bed,
    Activity,
}

impl RecordKind {
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Bed => "beds",
            RecordKind::Activity => "activities",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Bed => write!(f, "bed"),
            RecordKind::Activity => write!(f, "activity"),
        }
    }
}

/// Behaviour shared by beds and activities so stores and the cache can
/// handle both collections with the same code.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> &str;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Sets `updated_at`.
    fn touch(&mut self, at: DateTime<Utc>);

    /// Copies the immutable fields (`id`, `created_at`) from `prior`.
    fn keep_identity(&mut self, prior: &Self);
}

/// Optional free-text notes. Spreadsheets hand back blank cells as `""`
/// and some proxies as `null`; both mean "no notes".
pub(crate) mod notes {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let notes = Option::<String>::deserialize(deserializer)?;
        Ok(notes.filter(|n| !n.is_empty()))
    }

    pub fn from_cell(cell: &str) -> Option<String> {
        if cell.is_empty() {
            None
        } else {
            Some(cell.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_names() {
        assert_eq!(RecordKind::Bed.to_string(), "bed");
        assert_eq!(RecordKind::Activity.plural(), "activities");
        assert_eq!(GardenBed::KIND, RecordKind::Bed);
        assert_eq!(GardenActivity::KIND, RecordKind::Activity);
    }

    #[test]
    fn test_notes_from_cell() {
        assert_eq!(notes::from_cell(""), None);
        assert_eq!(notes::from_cell("mulched"), Some("mulched".to_string()));
    }
}
