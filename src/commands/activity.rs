use chrono::{DateTime, NaiveTime, Utc};
use clap::{Args, Subcommand};
use std::io::{self, Write};

use super::bed::find_bed;
use super::{describe, non_blank, OutputFormat};
use gardenlog_core::models::timestamp;
use gardenlog_core::{ActivityType, Garden, GardenActivity, NewActivity};

#[derive(Args)]
pub struct ActivityCommand {
    #[command(subcommand)]
    pub command: ActivitySubcommand,
}

#[derive(Subcommand)]
pub enum ActivitySubcommand {
    /// List activities, newest first
    List {
        /// Only activities of this bed
        #[arg(long = "bed", value_name = "BED_ID")]
        bed: Option<String>,

        /// Only activities of this type (plant, water, fertilize, harvest, other)
        #[arg(long = "type", value_name = "TYPE")]
        activity_type: Option<ActivityType>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Log an activity against a bed
    Log {
        /// Bed ID
        bed_id: String,

        /// Activity type (plant, water, fertilize, harvest, other)
        #[arg(value_name = "TYPE")]
        activity_type: ActivityType,

        /// When it happened (YYYY-MM-DD or RFC 3339); defaults to today
        #[arg(long, value_parser = timestamp::parse)]
        date: Option<DateTime<Utc>>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Update a logged activity
    Update {
        /// Activity ID
        id: String,

        /// New type
        #[arg(long = "type", value_name = "TYPE")]
        activity_type: Option<ActivityType>,

        /// New date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = timestamp::parse)]
        date: Option<DateTime<Utc>>,

        /// New notes (pass an empty string to clear)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a logged activity
    Delete {
        /// Activity ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ActivityCommand {
    pub async fn run(&self, garden: &Garden) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ActivitySubcommand::List {
                bed,
                activity_type,
                format,
            } => {
                let activities = match bed {
                    Some(bed_id) => garden.activities_for_bed(&find_bed(garden, bed_id)?.id),
                    None => garden.activities(),
                };
                let activities = newest_first(of_type(activities, *activity_type));

                if activities.is_empty() {
                    println!("No activities found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&activities)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<10}  {:<9}  {:<20}  NOTES", "DATE", "TYPE", "BED");
                        println!("{}", "-".repeat(70));
                        for activity in &activities {
                            let bed_name = garden
                                .bed(&activity.bed_id)
                                .map(|b| b.name)
                                .unwrap_or_else(|| format!("({})", activity.bed_id));
                            println!(
                                "{:<10}  {:<9}  {:<20}  {}",
                                activity.date.format("%Y-%m-%d"),
                                activity.activity_type,
                                bed_name,
                                activity.notes.as_deref().unwrap_or("")
                            );
                        }
                        println!("\nTotal: {} activity(ies)", activities.len());
                    }
                }
                Ok(())
            }

            ActivitySubcommand::Log {
                bed_id,
                activity_type,
                date,
                notes,
            } => {
                let bed = find_bed(garden, bed_id)?;
                let date = date.unwrap_or_else(today);

                let mut activity = NewActivity::new(bed.id, *activity_type, date);
                if let Some(notes) = non_blank(notes) {
                    activity = activity.with_notes(notes);
                }

                let created = garden
                    .add_activity(activity)
                    .await
                    .map_err(|e| describe(&e))?;
                println!("Logged activity for '{}':", bed.name);
                println!("{}", created);
                Ok(())
            }

            ActivitySubcommand::Update {
                id,
                activity_type,
                date,
                notes,
            } => {
                if activity_type.is_none() && date.is_none() && notes.is_none() {
                    return Err("Nothing to update. Provide --type, --date or --notes.".into());
                }

                let mut activity = find_activity(garden, id)?;
                if let Some(activity_type) = activity_type {
                    activity.activity_type = *activity_type;
                }
                if let Some(date) = date {
                    activity.date = *date;
                }
                if notes.is_some() {
                    activity.notes = non_blank(notes);
                }

                let updated = garden
                    .update_activity(activity)
                    .await
                    .map_err(|e| describe(&e))?;
                println!("Updated activity:");
                println!("{}", updated);
                Ok(())
            }

            ActivitySubcommand::Delete { id, force } => {
                let activity = find_activity(garden, id)?;

                if !force {
                    print!(
                        "Delete {} activity from {}? [y/N] ",
                        activity.activity_type,
                        activity.date.format("%Y-%m-%d")
                    );
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                garden
                    .delete_activity(&activity.id)
                    .await
                    .map_err(|e| describe(&e))?;
                println!("Deleted activity: {}", activity.id);
                Ok(())
            }
        }
    }
}

fn find_activity(garden: &Garden, id: &str) -> Result<GardenActivity, String> {
    garden
        .activity(id)
        .ok_or_else(|| format!("Activity not found: {}", id))
}

/// Midnight UTC of the current day, matching a bare `YYYY-MM-DD` date.
fn today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn of_type(
    activities: Vec<GardenActivity>,
    activity_type: Option<ActivityType>,
) -> Vec<GardenActivity> {
    match activity_type {
        Some(wanted) => activities
            .into_iter()
            .filter(|a| a.activity_type == wanted)
            .collect(),
        None => activities,
    }
}

/// Sorts by activity date, latest first. Same-day entries keep their order.
pub fn newest_first(mut activities: Vec<GardenActivity>) -> Vec<GardenActivity> {
    activities.sort_by(|a, b| b.date.cmp(&a.date));
    activities
}
