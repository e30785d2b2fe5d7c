use std::path::Path;

use anyhow::Result;
use calnote_core::CalnoteConfig;
use owo_colors::OwoColorize;

pub fn run(explicit_path: Option<&Path>, config: &CalnoteConfig) -> Result<()> {
    let config_path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => CalnoteConfig::config_path()?,
    };

    if !config_path.exists() {
        CalnoteConfig::create_default_config(&config_path)?;
        println!("Created {}", config_path.display().green());
    }

    let url = if config.calendar_url.is_empty() {
        "(not set)".to_string()
    } else {
        config.calendar_url.clone()
    };

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Notes:      {}", config.expanded_notes_dir()?.display());
    println!("  Store:      {}", config.expanded_store_path()?.display());
    println!();
    println!("{}", "Settings".bold());
    println!("  Calendar:   {url}");
    println!("  Extension:  .{}", config.note_extension());
    println!("  Settle:     {}", config.settle_delay);
    println!("  Timeout:    {}", config.fetch_timeout);

    Ok(())
}
