use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of work was done in a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Plant,
    Water,
    Fertilize,
    Harvest,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Plant,
        ActivityType::Water,
        ActivityType::Fertilize,
        ActivityType::Harvest,
        ActivityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Plant => "plant",
            ActivityType::Water => "water",
            ActivityType::Fertilize => "fertilize",
            ActivityType::Harvest => "harvest",
            ActivityType::Other => "other",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plant" => Ok(ActivityType::Plant),
            "water" => Ok(ActivityType::Water),
            "fertilize" => Ok(ActivityType::Fertilize),
            "harvest" => Ok(ActivityType::Harvest),
            "other" => Ok(ActivityType::Other),
            _ => Err(format!(
                "Invalid activity type '{}'. Valid options: plant, water, fertilize, harvest, other",
                s
            )),
        }
    }
}
