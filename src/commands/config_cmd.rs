use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;

use super::OutputFormat;
use gardenlog_core::{Backend, ConfigSource, FileSettings, SettingKey, SettingsStore};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show all settings and where each value comes from
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print one setting
    Get {
        /// Setting name, e.g. SPREADSHEET_ID
        key: SettingKey,
    },

    /// Store a setting in the settings file
    Set {
        /// Setting name, e.g. SPREADSHEET_ID
        key: SettingKey,

        /// New value
        value: String,
    },

    /// Remove a setting from the settings file
    Unset {
        /// Setting name, e.g. SPREADSHEET_ID
        key: SettingKey,
    },
}

#[derive(Serialize)]
struct ShownValue {
    value: String,
    source: ConfigSource,
}

#[derive(Serialize)]
struct ShownSettings {
    settings_file: String,
    backend: Option<Backend>,
    values: BTreeMap<&'static str, Option<ShownValue>>,
}

impl ConfigCommand {
    pub fn run(&self, settings: &FileSettings) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                let mut values = BTreeMap::new();
                for key in SettingKey::ALL {
                    let shown = settings.resolve(key)?.map(|v| ShownValue {
                        value: display_value(key, &v.value),
                        source: v.source,
                    });
                    values.insert(key.as_str(), shown);
                }
                let backend = Backend::select(settings)?;

                match format {
                    OutputFormat::Json => {
                        let shown = ShownSettings {
                            settings_file: settings.path().display().to_string(),
                            backend,
                            values,
                        };
                        println!("{}", serde_json::to_string_pretty(&shown)?);
                    }
                    OutputFormat::Text => {
                        println!("Settings");
                        println!("========\n");

                        if settings.path().exists() {
                            println!("Settings file: {}", settings.path().display());
                        } else {
                            println!("Settings file: {} (not found)", settings.path().display());
                        }
                        match backend {
                            Some(backend) => println!("Backend: {}", backend),
                            None => println!("Backend: none (not configured)"),
                        }
                        println!();

                        for key in SettingKey::ALL {
                            match &values[key.as_str()] {
                                Some(shown) => {
                                    println!("{}: {}", key, shown.value);
                                    println!("  source: {}", shown.source);
                                }
                                None => println!("{}: (not set)", key),
                            }
                        }
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Get { key } => match settings.resolve(*key)? {
                Some(value) => {
                    println!("{}", value.value);
                    Ok(())
                }
                None => Err(format!("{} is not set", key).into()),
            },

            ConfigSubcommand::Set { key, value } => {
                key.validate(value)?;
                settings.set(*key, value)?;

                println!("Set {} in {}", key, settings.path().display());
                if std::env::var(key.env_var()).is_ok_and(|v| !v.trim().is_empty()) {
                    eprintln!(
                        "Warning: {} is set and overrides the file value",
                        key.env_var()
                    );
                }
                Ok(())
            }

            ConfigSubcommand::Unset { key } => {
                settings.unset(*key)?;
                println!("Removed {} from {}", key, settings.path().display());
                Ok(())
            }
        }
    }
}

/// Secrets are shown with all but their last four characters masked.
fn display_value(key: SettingKey, value: &str) -> String {
    if !key.is_secret() {
        return value.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(settings: &FileSettings, command: ConfigSubcommand) -> Result<(), String> {
        ConfigCommand { command }
            .run(settings)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_set_and_unset_write_the_file() {
        let dir = TempDir::new().unwrap();
        let settings = FileSettings::new(dir.path().join("nested").join("settings.yaml"));

        run(
            &settings,
            ConfigSubcommand::Set {
                key: SettingKey::SpreadsheetId,
                value: "1AbC".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            settings.get(SettingKey::SpreadsheetId).unwrap().as_deref(),
            Some("1AbC")
        );

        run(
            &settings,
            ConfigSubcommand::Unset {
                key: SettingKey::SpreadsheetId,
            },
        )
        .unwrap();
        assert_eq!(settings.get(SettingKey::SpreadsheetId).unwrap(), None);
    }

    #[test]
    fn test_set_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        let settings = FileSettings::new(dir.path().join("settings.yaml"));

        let err = run(
            &settings,
            ConfigSubcommand::Set {
                key: SettingKey::BedsApiUrl,
                value: "sheet.best/api".to_string(),
            },
        )
        .unwrap_err();
        assert!(err.contains("http"), "{err}");
        assert!(!settings.path().exists());
    }

    #[test]
    fn test_get_unset_key_fails() {
        let dir = TempDir::new().unwrap();
        let settings = FileSettings::new(dir.path().join("settings.yaml"));

        let err = run(
            &settings,
            ConfigSubcommand::Get {
                key: SettingKey::BedsApiUrl,
            },
        )
        .unwrap_err();
        assert_eq!(err, "BEDS_API_URL is not set");
    }

    #[test]
    fn test_display_value_masks_api_key() {
        assert_eq!(
            display_value(SettingKey::GoogleApiKey, "AIzaSyExample1234"),
            "****1234"
        );
        assert_eq!(display_value(SettingKey::GoogleApiKey, "abc"), "****");
    }

    #[test]
    fn test_display_value_leaves_other_keys() {
        assert_eq!(
            display_value(SettingKey::SpreadsheetId, "1AbCdEf"),
            "1AbCdEf"
        );
    }
}
