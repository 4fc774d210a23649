//! `ferry config`: show and set configuration values.

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;
use crate::domain::config::{VALID_CONFIG_KEYS, config_value};
use crate::infra::config::CONFIG_ENV;
use crate::output::json::to_pretty;

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, or the key or
/// value is invalid.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<()> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    if app.is_json() {
        let obj = serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        });
        println!("{}", to_pretty(&obj)?);
        return Ok(());
    }
    app.output.header("Configuration");
    for key in VALID_CONFIG_KEYS {
        let value = config_value(&config, key).unwrap_or_default();
        app.output.kv(key, &value);
    }
    app.output.info(&format!(
        "File: {} (override with {CONFIG_ENV})",
        path.display()
    ));
    Ok(())
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<()> {
    config_service::set_config_value(&app.config_store, key, value)?;
    if app.is_json() {
        println!(
            "{}",
            to_pretty(&serde_json::json!({ "key": key, "value": value }))?
        );
    } else {
        app.output.success(&format!("Set {key} = {value}"));
    }
    Ok(())
}
