//! Configuration view and validation commands: `stayloop config`.

use anyhow::{Context, Result, bail};

use stayloop::config::{Config, StayloopToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &Config, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let mut effective = config.toml.clone();
            if effective.extractor.api_key.is_some() {
                effective.extractor.api_key = Some("********".to_string());
            }

            if config.json {
                return super::print_json(&effective);
            }

            println!();
            println!("Stayloop Configuration");
            println!("======================");
            println!();
            if config.config_path.exists() {
                println!("Config file: {}", config.config_path.display());
            } else {
                println!(
                    "No stayloop.toml at {} (using defaults)",
                    config.config_path.display()
                );
            }
            println!("State dir:   {}", config.state_dir.display());
            println!("Sessions:    {}", config.sessions_dir().display());
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!();
            let rendered =
                toml::to_string_pretty(&effective).context("Failed to render configuration")?;
            println!("{}", rendered);
            Ok(())
        }
        Some(ConfigCommands::Validate) => {
            let warnings = config.validate();
            if config.json {
                return super::print_json(&warnings);
            }
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
            Ok(())
        }
        Some(ConfigCommands::Init) => {
            if config.config_path.exists() {
                bail!(
                    "Config file already exists: {}",
                    config.config_path.display()
                );
            }
            StayloopToml::default().save(&config.config_path)?;
            println!("Created {}", config.config_path.display());
            Ok(())
        }
    }
}
