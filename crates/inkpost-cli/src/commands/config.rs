//! Config command handlers

use anyhow::{Context, Result};

use inkpost_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database": config.sqlite_path(),
                    "max_attempts": config.max_attempts,
                    "max_tags": config.max_tags,
                    "max_page_depth": config.max_page_depth,
                    "batch_size": config.batch_size,
                    "busy_timeout_ms": config.busy_timeout_ms
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:        {}", config.data_dir.display());
            println!("  max_attempts:    {}", config.max_attempts);
            println!("  max_tags:        {}", config.max_tags);
            println!("  max_page_depth:  {}", config.max_page_depth);
            println!("  batch_size:      {}", config.batch_size);
            println!("  busy_timeout_ms: {}", config.busy_timeout_ms);
            println!();
            println!("Database:    {}", config.sqlite_path().display());
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Print the config file path
pub fn path(output: &Output) -> Result<()> {
    let path = Config::config_file_path();
    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "path": path })),
        OutputFormat::Human | OutputFormat::Quiet => println!("{}", path.display()),
    }
    Ok(())
}
