use clap::{Args, Subcommand};
use std::io::{self, Write};

use super::{activity, describe, non_blank, OutputFormat};
use gardenlog_core::{Garden, GardenBed, NewBed};

#[derive(Args)]
pub struct BedCommand {
    #[command(subcommand)]
    pub command: BedSubcommand,
}

#[derive(Subcommand)]
pub enum BedSubcommand {
    /// List all beds
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a bed and its activities, newest first
    Show {
        /// Bed ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a new bed
    Add {
        /// Name of the bed
        name: String,

        /// Notes (sun, soil, drainage, ...)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Update an existing bed
    Update {
        /// Bed ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New notes (pass an empty string to clear)
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a bed and every activity logged against it
    Delete {
        /// Bed ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl BedCommand {
    pub async fn run(&self, garden: &Garden) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            BedSubcommand::List { format } => {
                let beds = garden.beds();

                if beds.is_empty() {
                    println!("No beds found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&beds)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<39}  {:<30}  ACTIVITIES", "ID", "NAME");
                        println!("{}", "-".repeat(83));
                        for bed in &beds {
                            println!(
                                "{:<39}  {:<30}  {}",
                                bed.id,
                                truncate(&bed.name, 30),
                                garden.activities_for_bed(&bed.id).len()
                            );
                        }
                        println!("\nTotal: {} bed(s)", beds.len());
                    }
                }
                Ok(())
            }

            BedSubcommand::Show { id, format } => {
                let bed = find_bed(garden, id)?;
                let activities = activity::newest_first(garden.activities_for_bed(&bed.id));

                match format {
                    OutputFormat::Json => {
                        let detail = serde_json::json!({
                            "bed": bed,
                            "activities": activities,
                        });
                        println!("{}", serde_json::to_string_pretty(&detail)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", bed);
                        println!();
                        if activities.is_empty() {
                            println!("No activities logged yet");
                        } else {
                            println!("Activities:");
                            for activity in &activities {
                                println!("  {}", activity);
                            }
                        }
                    }
                }
                Ok(())
            }

            BedSubcommand::Add { name, notes } => {
                let name = validate_name(name)?;

                let mut bed = NewBed::new(name);
                if let Some(notes) = non_blank(notes) {
                    bed = bed.with_notes(notes);
                }

                let created = garden.add_bed(bed).await.map_err(|e| describe(&e))?;
                println!("Created bed:");
                println!("{}", created);
                Ok(())
            }

            BedSubcommand::Update { id, name, notes } => {
                if name.is_none() && notes.is_none() {
                    return Err("Nothing to update. Provide --name or --notes.".into());
                }

                let mut bed = find_bed(garden, id)?;
                if let Some(name) = name {
                    bed.name = validate_name(name)?;
                }
                if notes.is_some() {
                    bed.notes = non_blank(notes);
                }

                let updated = garden.update_bed(bed).await.map_err(|e| describe(&e))?;
                println!("Updated bed:");
                println!("{}", updated);
                Ok(())
            }

            BedSubcommand::Delete { id, force } => {
                let bed = find_bed(garden, id)?;
                let logged = garden.activities_for_bed(&bed.id).len();

                if !force {
                    print!(
                        "Delete bed '{}' and its {} activity(ies)? [y/N] ",
                        bed.name, logged
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
                    .delete_bed(&bed.id)
                    .await
                    .map_err(|e| describe(&e))?;
                println!("Deleted bed: {}", bed.name);
                Ok(())
            }
        }
    }
}

pub fn find_bed(garden: &Garden, id: &str) -> Result<GardenBed, String> {
    garden
        .bed(id)
        .ok_or_else(|| format!("Bed not found: {}", id))
}

fn validate_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Bed name cannot be empty".to_string());
    }
    Ok(name.to_string())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
