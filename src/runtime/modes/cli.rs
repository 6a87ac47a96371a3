//! CLI mode

use anyhow::{Result, anyhow, bail};
use colored::Colorize;
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::StaticConfig;

const DEFAULT_SAMPLE_PATH: &str = "config.example.toml";

pub fn run_config_command(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Generate { output_path, force } => {
            let path = output_path.unwrap_or_else(|| DEFAULT_SAMPLE_PATH.to_string());
            generate_config(Path::new(&path), force)
        }
    }
}

fn generate_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite",
            path.display()
        );
    }
    StaticConfig::default()
        .save_to_file(path)
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
    println!(
        "{} Sample configuration written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}
