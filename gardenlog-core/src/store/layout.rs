//! Positional encoding of records into spreadsheet rows.
//!
//! Each record type declares its columns as an ordered list
//! ([`SheetRecord::COLUMNS`]) with matching `to_cells`/`from_cells`. A
//! [`RowLayout`] binds that list to the header row of a sheet once, so
//! encoding and decoding are plain index lookups.
//!
//! Grid conventions follow the values API: row 0 of a grid is the header,
//! sheet rows are 1-based, so grid row `i` is sheet row `i + 1`.

use chrono::{DateTime, Utc};
use std::marker::PhantomData;

use crate::models::{notes, timestamp, ActivityType, GardenActivity, GardenBed};

/// Header name of the identity column.
pub const ID_COLUMN: &str = "id";

/// A record that can be stored as one spreadsheet row.
pub trait SheetRecord: Sized {
    /// Column names, in the order used by `to_cells` and `from_cells`.
    const COLUMNS: &'static [&'static str];

    fn to_cells(&self) -> Vec<String>;

    /// Builds a record from cells in `COLUMNS` order. Missing cells are `""`.
    fn from_cells(cells: &[String]) -> Result<Self, String>;
}

impl SheetRecord for GardenBed {
    const COLUMNS: &'static [&'static str] = &["id", "name", "notes", "createdAt", "updatedAt"];

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.notes.clone().unwrap_or_default(),
            timestamp::format(&self.created_at),
            timestamp::format(&self.updated_at),
        ]
    }

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        let (created_at, updated_at) = stamps(&cells[3], &cells[4])?;
        Ok(GardenBed {
            id: cells[0].clone(),
            name: cells[1].clone(),
            notes: notes::from_cell(&cells[2]),
            created_at,
            updated_at,
        })
    }
}

impl SheetRecord for GardenActivity {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "bedId",
        "type",
        "date",
        "notes",
        "createdAt",
        "updatedAt",
    ];

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.bed_id.clone(),
            self.activity_type.to_string(),
            timestamp::format(&self.date),
            self.notes.clone().unwrap_or_default(),
            timestamp::format(&self.created_at),
            timestamp::format(&self.updated_at),
        ]
    }

    fn from_cells(cells: &[String]) -> Result<Self, String> {
        let (created_at, updated_at) = stamps(&cells[5], &cells[6])?;
        let date = optional_timestamp(&cells[3]).map_err(|e| format!("date: {}", e))?;
        Ok(GardenActivity {
            id: cells[0].clone(),
            bed_id: cells[1].clone(),
            activity_type: cells[2].parse::<ActivityType>()?,
            date: date.unwrap_or(created_at),
            notes: notes::from_cell(&cells[4]),
            created_at,
            updated_at,
        })
    }
}

/// Creation and update stamps of a row. A blank stamp takes the other
/// one; a row with neither dates from the Unix epoch.
fn stamps(created: &str, updated: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    let created = optional_timestamp(created).map_err(|e| format!("createdAt: {}", e))?;
    let updated = optional_timestamp(updated).map_err(|e| format!("updatedAt: {}", e))?;
    Ok(match (created, updated) {
        (Some(created), Some(updated)) => (created, updated),
        (Some(only), None) | (None, Some(only)) => (only, only),
        (None, None) => (DateTime::UNIX_EPOCH, DateTime::UNIX_EPOCH),
    })
}

fn optional_timestamp(cell: &str) -> Result<Option<DateTime<Utc>>, String> {
    if cell.trim().is_empty() {
        return Ok(None);
    }
    timestamp::parse(cell).map(Some)
}

/// The binding between a sheet's header row and a record's columns.
#[derive(Debug, Clone)]
pub struct RowLayout<T> {
    /// For each header position, the record column it holds (if any).
    slots: Vec<Option<usize>>,
    /// For each record column, the header position holding it (if any).
    positions: Vec<Option<usize>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: SheetRecord> RowLayout<T> {
    pub fn new(headers: &[String]) -> Self {
        let slots: Vec<Option<usize>> = headers
            .iter()
            .map(|header| T::COLUMNS.iter().position(|c| *c == header.trim()))
            .collect();
        let positions = (0..T::COLUMNS.len())
            .map(|column| slots.iter().position(|slot| *slot == Some(column)))
            .collect();

        Self {
            slots,
            positions,
            _record: PhantomData,
        }
    }

    /// Number of header cells.
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    /// Record columns with no header in the sheet.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        T::COLUMNS
            .iter()
            .zip(&self.positions)
            .filter(|(_, position)| position.is_none())
            .map(|(column, _)| *column)
            .collect()
    }

    /// Header position of the `id` column.
    pub fn id_position(&self) -> Option<usize> {
        T::COLUMNS
            .iter()
            .position(|c| *c == ID_COLUMN)
            .and_then(|column| self.positions[column])
    }

    /// Cells in header order. Headers the record does not know get `""`.
    pub fn encode(&self, record: &T) -> Vec<String> {
        let cells = record.to_cells();
        self.slots
            .iter()
            .map(|slot| slot.map(|column| cells[column].clone()).unwrap_or_default())
            .collect()
    }

    /// Decodes a row, padding short rows with empty strings.
    pub fn decode(&self, row: &[String]) -> Result<T, String> {
        let cells: Vec<String> = self
            .positions
            .iter()
            .map(|position| {
                position
                    .and_then(|p| row.get(p))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        T::from_cells(&cells)
    }
}

/// Decodes every data row of a grid.
///
/// A grid with one row or fewer has no records. Blank rows (left behind by
/// clearing a row) are skipped. Errors carry the 1-based sheet row number.
pub fn decode_grid<T: SheetRecord>(grid: &[Vec<String>]) -> Result<Vec<T>, String> {
    let Some((headers, rows)) = grid.split_first() else {
        return Ok(Vec::new());
    };
    let layout = RowLayout::<T>::new(headers);

    rows.iter()
        .enumerate()
        .filter(|(_, row)| !is_blank(row))
        .map(|(index, row)| {
            layout
                .decode(row)
                .map_err(|e| format!("row {}: {}", index + 2, e))
        })
        .collect()
}

/// Finds the 1-based sheet row whose `id` cell equals `id`.
///
/// Returns `None` when the grid has no header, the header has no `id`
/// column, or no row matches.
pub fn locate_row<T: SheetRecord>(grid: &[Vec<String>], id: &str) -> Option<usize> {
    if id.is_empty() {
        return None;
    }
    let (headers, rows) = grid.split_first()?;
    let id_column = RowLayout::<T>::new(headers).id_position()?;

    rows.iter()
        .position(|row| row.get(id_column).map(String::as_str) == Some(id))
        .map(|index| index + 2)
}

/// A1 column letters for a 1-based column number: 1 → A, 26 → Z, 27 → AA.
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn bed_headers() -> Vec<String> {
        row(&["id", "name", "notes", "createdAt", "updatedAt"])
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(5), "E");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(column_letter(0), "");
    }

    #[test]
    fn test_decode_empty_grids() {
        assert!(decode_grid::<GardenBed>(&[]).unwrap().is_empty());
        assert!(decode_grid::<GardenBed>(&[bed_headers()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_decode_pads_short_rows() {
        // The API drops trailing empty cells, so the notes cell is absent
        let grid = vec![
            row(&["id", "createdAt", "updatedAt", "name", "notes"]),
            row(&["2", "2025-01-01", "2025-01-01", "Herbs"]),
        ];
        let beds = decode_grid::<GardenBed>(&grid).unwrap();
        assert_eq!(beds[0].id, "2");
        assert_eq!(beds[0].name, "Herbs");
        assert!(beds[0].notes.is_none());
    }

    #[test]
    fn test_decode_skips_cleared_rows() {
        let grid = vec![
            bed_headers(),
            row(&["1", "A", "", "2025-01-01", "2025-01-01"]),
            row(&[]),
            row(&["", "", ""]),
            row(&["3", "C", "", "2025-01-01", "2025-01-01"]),
        ];
        let beds = decode_grid::<GardenBed>(&grid).unwrap();
        let ids: Vec<_> = beds.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_decode_row_without_timestamps() {
        let grid = vec![bed_headers(), row(&["1", "Tomato Bed"])];
        let beds = decode_grid::<GardenBed>(&grid).unwrap();
        assert_eq!(beds.len(), 1);
        assert_eq!(beds[0].name, "Tomato Bed");
        assert!(beds[0].notes.is_none());
        assert_eq!(beds[0].created_at, DateTime::UNIX_EPOCH);
        assert_eq!(beds[0].updated_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_decode_blank_stamp_takes_the_other() {
        let grid = vec![
            row(&["id", "bedId", "type", "date", "notes", "createdAt", "updatedAt"]),
            row(&["10", "1", "water", "", "", "", "2025-06-01T07:05:00.000Z"]),
        ];
        let activities = decode_grid::<GardenActivity>(&grid).unwrap();
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 7, 5, 0).unwrap();
        assert_eq!(activities[0].created_at, stamp);
        assert_eq!(activities[0].updated_at, stamp);
        assert_eq!(activities[0].date, stamp);
    }

    #[test]
    fn test_decode_reports_sheet_row() {
        let grid = vec![
            bed_headers(),
            row(&["1", "A", "", "2025-01-01", "2025-01-01"]),
            row(&["2", "B", "", "yesterday", "2025-01-01"]),
        ];
        let err = decode_grid::<GardenBed>(&grid).unwrap_err();
        assert!(err.starts_with("row 3:"), "{}", err);
        assert!(err.contains("createdAt"));
    }

    #[test]
    fn test_decode_activity() {
        let grid = vec![
            row(&["id", "bedId", "type", "date", "notes", "createdAt", "updatedAt"]),
            row(&[
                "10",
                "1",
                "water",
                "2025-06-01T07:00:00.000Z",
                "Deep watering",
                "2025-06-01T07:05:00.000Z",
                "2025-06-01T07:05:00.000Z",
            ]),
        ];
        let activities = decode_grid::<GardenActivity>(&grid).unwrap();
        assert_eq!(activities[0].activity_type, ActivityType::Water);
        assert_eq!(activities[0].notes.as_deref(), Some("Deep watering"));
    }

    #[test]
    fn test_encode_follows_header_order() {
        let at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        let bed = GardenBed {
            id: "123".to_string(),
            name: "Tomato Bed".to_string(),
            notes: None,
            created_at: at,
            updated_at: at,
        };

        let layout = RowLayout::<GardenBed>::new(&row(&["name", "id", "color", "notes"]));
        assert_eq!(layout.encode(&bed), row(&["Tomato Bed", "123", "", ""]));
        assert_eq!(layout.width(), 4);
        assert_eq!(layout.missing_columns(), vec!["createdAt", "updatedAt"]);
        assert_eq!(layout.id_position(), Some(1));
    }

    #[test]
    fn test_layout_without_id_column() {
        let layout = RowLayout::<GardenBed>::new(&row(&["name", "notes"]));
        assert_eq!(layout.id_position(), None);
    }

    #[test]
    fn test_locate_row_is_one_based_after_header() {
        let grid = vec![
            bed_headers(),
            row(&["a"]),
            row(&["b"]),
            row(&["c"]),
        ];
        assert_eq!(locate_row::<GardenBed>(&grid, "a"), Some(2));
        assert_eq!(locate_row::<GardenBed>(&grid, "c"), Some(4));
        assert_eq!(locate_row::<GardenBed>(&grid, "zzz"), None);
        assert_eq!(locate_row::<GardenBed>(&grid, ""), None);
    }

    #[test]
    fn test_locate_row_without_id_column() {
        let grid = vec![row(&["name"]), row(&["a"])];
        assert_eq!(locate_row::<GardenBed>(&grid, "a"), None);
        assert_eq!(locate_row::<GardenBed>(&[], "a"), None);
    }

    #[test]
    fn test_locate_row_id_column_not_first() {
        let grid = vec![row(&["name", "id"]), row(&["Herbs", "7"])];
        assert_eq!(locate_row::<GardenBed>(&grid, "7"), Some(2));
    }
}
