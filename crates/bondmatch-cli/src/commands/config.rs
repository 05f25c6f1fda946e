//! Config inspection commands

use std::path::Path;

use anyhow::{Context, Result};
use bondmatch_core::config::{default_config_path, ReconConfig};

pub fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = ReconConfig::load(path).context("Failed to load config")?;

    match path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => match default_config_path() {
            Some(default_path) if default_path.exists() => {
                println!("# Loaded from {}", default_path.display())
            }
            _ => println!("# Built-in defaults"),
        },
    }
    print!("{}", config.to_toml()?);

    Ok(())
}

pub fn cmd_config_path() -> Result<()> {
    match default_config_path() {
        Some(path) => {
            println!("{}", path.display());

            // Check if file exists
            if !path.exists() {
                eprintln!();
                eprintln!("Note: This file does not exist yet.");
                eprintln!("Create it to override the built-in defaults.");
            }
        }
        None => {
            eprintln!("Could not determine config directory.");
            eprintln!("The data directory is not available on this system.");
        }
    }

    Ok(())
}
