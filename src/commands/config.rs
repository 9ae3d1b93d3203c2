//! Configuration commands.
//!
//! - `config show`: Display the effective configuration
//! - `config get`: Print one value
//! - `config set`: Set a value

use owo_colors::OwoColorize;
use serde_json::json;

use super::print_json;
use crate::config::Config;
use crate::error::Result;

/// Show current configuration
pub fn cmd_config_show(json: bool) -> Result<()> {
    let config = Config::load()?;

    if json {
        return print_json(&json!({
            "api": {
                "url": config.api_url(),
                "timeout_secs": config.api.timeout_secs,
            },
            "list": {
                "page_size": config.list.page_size,
                "debounce_ms": config.list.debounce_ms,
                "cache_ttl_secs": config.list.cache_ttl_secs,
            },
            "config_file": Config::config_path().to_string_lossy(),
        }));
    }

    println!("{}\n", "Configuration:".cyan().bold());
    println!("{}:", "api".cyan());
    println!("  url: {}", config.api_url());
    println!("  timeout_secs: {}", config.api.timeout_secs);
    println!();
    println!("{}:", "list".cyan());
    println!("  page_size: {}", config.list.page_size);
    println!("  debounce_ms: {}", config.list.debounce_ms);
    println!("  cache_ttl_secs: {}", config.list.cache_ttl_secs);
    println!();
    println!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    );
    Ok(())
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    println!("Set {} = {}", key.cyan(), config.get(key)?);
    Ok(())
}

/// Get a configuration value
pub fn cmd_config_get(key: &str) -> Result<()> {
    let config = Config::load()?;
    println!("{}", config.get(key)?);
    Ok(())
}
