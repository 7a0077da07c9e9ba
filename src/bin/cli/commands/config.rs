use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run_show(app: &App, format: &OutputFormat) -> Result<()> {
    let value = serde_json::to_value(&app.config)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            println!("Settings file: {}", app.config_store.settings_path().display());
            if let Some(fields) = value.as_object() {
                for (key, field) in fields {
                    // Strings print bare, everything else as JSON
                    let shown = field.as_str().map(str::to_string).unwrap_or_else(|| field.to_string());
                    println!("  {} = {}", key, shown);
                }
            }
        }
    }

    Ok(())
}

pub fn run_set(app: &App, key: &str, value: &str, format: &OutputFormat) -> Result<()> {
    let config = app
        .config_store
        .update(key, value)
        .with_context(|| format!("Failed to update {}", key))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Plain => {
            println!("Saved {} = {}", key, value);
        }
    }

    Ok(())
}
