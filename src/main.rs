use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{ActivityCommand, BedCommand, ConfigCommand};
use gardenlog_core::FileSettings;

#[derive(Parser)]
#[command(name = "garden")]
#[command(version)]
#[command(about = "Track garden beds and the work done in them", long_about = None)]
struct Cli {
    /// Path to settings file
    #[arg(long, short, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage garden beds
    Bed(BedCommand),

    /// Log and review bed activities
    Activity(ActivityCommand),

    /// Manage settings
    Config(ConfigCommand),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gardenlog=warn,gardenlog_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match cli.settings {
        Some(path) => FileSettings::new(path),
        None => FileSettings::open_default(),
    };

    match cli.command {
        Some(Commands::Bed(cmd)) => {
            let garden = commands::open_garden(&settings).await?;
            cmd.run(&garden).await?;
        }
        Some(Commands::Activity(cmd)) => {
            let garden = commands::open_garden(&settings).await?;
            cmd.run(&garden).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&settings)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
