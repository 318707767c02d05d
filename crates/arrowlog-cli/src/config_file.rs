//! Persistent CLI configuration file.

use std::path::{Path, PathBuf};

use arrowlog_core::config::ClientConfig;

const CONFIG_FILE_NAME: &str = "config.json";
const ENV_CONFIG_PATH: &str = "ARROWLOG_CONFIG_PATH";

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("arrowlog").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, String> {
    match cli_config_path.or_else(|| std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_config_path(),
    }
}

/// Config stored at `path`, or defaults when the file does not exist yet.
pub fn load_from_path(path: &Path) -> Result<ClientConfig, String> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
    ClientConfig::from_json(&raw)
        .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))
}

/// Stored config with `ARROWLOG_*` environment overrides applied.
pub fn load_effective(path: &Path) -> Result<ClientConfig, String> {
    load_from_path(path)?
        .with_env_overrides()
        .normalized()
        .map_err(|error| error.to_string())
}

pub fn save_to_path(config: &ClientConfig, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            format!(
                "Failed to create config directory {}: {}",
                parent.display(),
                error
            )
        })?;
    }

    let normalized = config
        .clone()
        .normalized()
        .map_err(|error| error.to_string())?;
    let serialized = serde_json::to_string_pretty(&normalized)
        .map_err(|error| format!("Failed to serialize config: {error}"))?;
    std::fs::write(path, serialized)
        .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
}
