//! Config command handlers

use std::path::Path;

use anyhow::{bail, Context, Result};

use ocean_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config: &Config, config_path: &Path, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "name": config.name,
                    "kind": config.kind.to_string(),
                    "link_property": config.link_property,
                    "log_level": config.log_level
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!("  name:          {}", config.name);
            println!("  kind:          {}", config.kind);
            println!("  link_property: {}", config.link_property);
            println!("  log_level:     {}", config.log_level);
            println!();
            println!("Config file: {}", config_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value and save it
pub fn set(key: String, value: String, config_path: &Path, output: &Output) -> Result<()> {
    let mut config = Config::load_from_path(config_path).context("Failed to load configuration")?;
    apply(&mut config, &key, &value)?;

    config
        .save_to_path(config_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => config.data_dir = value.into(),
        "name" => {
            if value.is_empty() {
                bail!("name cannot be empty");
            }
            config.name = value.to_string();
        }
        "kind" => {
            config.kind = value
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid value for kind")?;
        }
        "link_property" => {
            if value.is_empty() {
                bail!("link_property cannot be empty");
            }
            config.link_property = value.to_string();
        }
        "log_level" => config.log_level = value.to_string(),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, name, kind, link_property, log_level",
                key
            );
        }
    }
    Ok(())
}
