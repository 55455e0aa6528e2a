//! Records shown when the very first load fails, so the app is never empty.

use crate::models::{timestamp, ActivityType, GardenActivity, GardenBed};

pub fn beds() -> Vec<GardenBed> {
    let now = timestamp::now();
    vec![
        GardenBed {
            id: "1".to_string(),
            name: "Tomato Bed".to_string(),
            notes: Some("South facing, good drainage".to_string()),
            created_at: now,
            updated_at: now,
        },
        GardenBed {
            id: "2".to_string(),
            name: "Herb Garden".to_string(),
            notes: Some("Partial shade, needs more water".to_string()),
            created_at: now,
            updated_at: now,
        },
    ]
}

pub fn activities() -> Vec<GardenActivity> {
    let now = timestamp::now();
    vec![
        GardenActivity {
            id: "1".to_string(),
            bed_id: "1".to_string(),
            activity_type: ActivityType::Plant,
            date: now,
            notes: Some("Planted Roma tomatoes, 6 plants".to_string()),
            created_at: now,
            updated_at: now,
        },
        GardenActivity {
            id: "2".to_string(),
            bed_id: "1".to_string(),
            activity_type: ActivityType::Water,
            date: now,
            notes: Some("Deep watering".to_string()),
            created_at: now,
            updated_at: now,
        },
    ]
}
