//! config command - Get, set, or list configuration values

use crate::cli::Context;
use crate::core::config::{Config, KNOWN_KEYS};
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::json;

/// Effective value of `key` after precedence, as text.
fn effective(config: &Config, key: &str) -> Option<String> {
    match key {
        "rpc_url" => Some(config.rpc_url().to_string()),
        "contract" => config.contract().map(|a| a.to_string()),
        "account" => config.account().map(|a| a.to_string()),
        "tx.poll_interval_ms" => Some(config.poll_interval().as_millis().to_string()),
        "tx.receipt_timeout_secs" => Some(config.receipt_timeout().as_secs().to_string()),
        "identity.nonce_strategy" => Some(config.nonce_strategy().name().to_string()),
        "web.base_url" => Some(config.web_base_url().to_string()),
        _ => None,
    }
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    // Rejects unknown keys.
    ctx.config.global.get_key(key)?;
    let value = effective(&ctx.config, key);

    if ctx.json {
        output::json(&json!({ "key": key, "value": value }))?;
    } else if let Some(value) = value {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value in the project config, or the global one.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let path = if global {
        let mut file = ctx.config.global.clone();
        file.set_key(key, value)?;
        Config::write_global(&file).context("Failed to write global config")?
    } else {
        let mut file = ctx.config.project.clone().unwrap_or_default();
        file.set_key(key, value)?;
        Config::write_project(&ctx.cwd, &file).context("Failed to write project config")?
    };

    output::success(
        format!("Set {} = {} ({})", key, value, path.display()),
        ctx.verbosity,
    );
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    if ctx.json {
        let values: serde_json::Map<String, serde_json::Value> = KNOWN_KEYS
            .iter()
            .map(|key| (key.to_string(), json!(effective(&ctx.config, key))))
            .collect();
        output::json(&values)?;
        return Ok(());
    }

    println!("# Effective configuration");
    match ctx.config.global_config_loaded_from() {
        Some(path) => println!("# global:  {}", path.display()),
        None => println!("# global:  (none)"),
    }
    match ctx.config.project_config_loaded_from() {
        Some(path) => println!("# project: {}", path.display()),
        None => println!("# project: (none)"),
    }

    for key in KNOWN_KEYS {
        match effective(&ctx.config, key) {
            Some(value) => println!("{} = {}", key, value),
            None => println!("{} = (not set)", key),
        }
    }
    Ok(())
}
