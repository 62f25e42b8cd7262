//! Settings file loading

use std::path::{Path, PathBuf};

use dcnview_core::prelude::*;

use super::types::Settings;

const CONFIG_DIR: &str = "dcnview";
const CONFIG_FILENAME: &str = "config.toml";

/// `<config dir>/dcnview/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

/// Read settings from `path`, failing if the file is missing or invalid
pub fn read_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let settings =
        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;
    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Load settings from `path`.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match read_settings(path) {
        Ok(settings) => settings,
        Err(Error::ConfigNotFound { .. }) => {
            debug!("No config file at {:?}, using defaults", path);
            Settings::default()
        }
        Err(_) => Settings::default(),
    }
}
