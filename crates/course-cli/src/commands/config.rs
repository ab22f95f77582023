//! Configuration loading and the check-config command

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use course_core::{ConfigResolver, ValidatedConfig, validate};
use course_remote::ReqwestHttpClient;

use crate::error::Result;

/// Resolve and validate the configuration. Any problem is fatal.
pub fn load_config(config_path: Option<&Path>) -> Result<ValidatedConfig> {
    let resolver = match config_path {
        Some(path) => ConfigResolver::with_path(path),
        None => ConfigResolver::new(),
    };
    let config = resolver.resolve()?;
    let client = Arc::new(ReqwestHttpClient::new()?);
    Ok(validate(&config, client)?)
}

/// Run the check-config command
pub fn run_check_config(config_path: Option<&Path>) -> Result<()> {
    println!("{} Checking configuration...", "=>".blue().bold());

    let config = load_config(config_path)?;

    println!("{} Configuration is valid.", "OK".green().bold());
    println!("   {} {}", "base_url:".dimmed(), config.api.base_url());
    println!("   {} {}", "root_dir:".dimmed(), config.root_dir.display());
    println!("   {} {}", "namespace:".dimmed(), config.namespace);
    println!("   {} {}", "workers:".dimmed(), config.workers);
    println!("   {} {}", "regexes:".dimmed(), config.rules.len());
    Ok(())
}
