use std::path::Path;

use arrowlog_core::config::{parse_time_zone, ClientConfig};
use arrowlog_core::util::normalize_base_url;

use crate::cli::ConfigCommands;
use crate::config_file::{load_effective, load_from_path, save_to_path};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let config = load_effective(config_path).map_err(CliError::Config)?;
            for line in format_config_lines(&config, config_path) {
                println!("{line}");
            }
            Ok(())
        }
        ConfigCommands::SetApi { url } => update_config(config_path, |config| {
            let url = normalize_base_url(&url).ok_or_else(|| {
                CliError::Config(format!(
                    "API base URL '{}' must include http:// or https://",
                    url.trim()
                ))
            })?;
            config.api_base_url = Some(url);
            Ok(())
        }),
        ConfigCommands::SetZone { zone } => update_config(config_path, |config| {
            config.reference_time_zone = parse_time_zone(&zone)?.name().to_string();
            Ok(())
        }),
        ConfigCommands::SetEditWindow { window } => update_config(config_path, |config| {
            config.edit_window = window.into();
            Ok(())
        }),
    }
}

fn update_config(
    config_path: &Path,
    apply: impl FnOnce(&mut ClientConfig) -> Result<(), CliError>,
) -> Result<(), CliError> {
    let mut config = load_from_path(config_path).map_err(CliError::Config)?;
    apply(&mut config)?;
    save_to_path(&config, config_path).map_err(CliError::Config)?;
    println!("Saved {}", config_path.display());
    Ok(())
}

pub fn format_config_lines(config: &ClientConfig, config_path: &Path) -> Vec<String> {
    let edit_window = serde_json::to_value(config.edit_window)
        .ok()
        .and_then(|value| value.as_str().map(ToString::to_string))
        .unwrap_or_default();

    vec![
        format!("config file          {}", config_path.display()),
        format!(
            "api_base_url         {}",
            config.api_base_url.as_deref().unwrap_or("(not set)")
        ),
        format!(
            "api_token            {}",
            if config.api_token.is_some() {
                "(set)"
            } else {
                "(not set)"
            }
        ),
        format!("reference_time_zone  {}", config.reference_time_zone),
        format!("edit_window          {edit_window}"),
        format!("shots_per_end        {}", config.default_shots_per_end),
        format!("request_timeout      {}s", config.request_timeout_secs),
    ]
}
