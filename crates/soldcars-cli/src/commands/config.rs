//! Config command handlers

use anyhow::{Context, Result};
use serde_json::json;

use soldcars_core::Config;

use crate::output::{Output, OutputFormat};

/// Show the effective configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                json!({
                    "hosts": config.hosts,
                    "replica_set": config.replica_set,
                    "database": config.database,
                    "collection": config.collection,
                    "write_timeout_ms": config.write_timeout_ms,
                    "listen": config.listen,
                    "poll_interval_ms": config.poll_interval_ms,
                    "member_timeout_secs": config.member_timeout_secs
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.hosts.join(","));
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  hosts:               {}", config.hosts.join(","));
            println!(
                "  replica_set:         {}",
                config.replica_set.as_deref().unwrap_or("(not set)")
            );
            println!("  database:            {}", config.database);
            println!("  collection:          {}", config.collection);
            println!("  write_timeout_ms:    {}", config.write_timeout_ms);
            println!("  listen:              {}", config.listen);
            println!("  poll_interval_ms:    {}", config.poll_interval_ms);
            println!("  member_timeout_secs: {}", config.member_timeout_secs);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}
