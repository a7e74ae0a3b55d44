//! Config file locations.

use std::path::PathBuf;

/// Name of the per-workspace config file
pub const WORKSPACE_CONFIG_FILE: &str = "norns-edit.toml";

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise the platform config
/// directory reported by `directories`.
pub fn config_home() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Some(PathBuf::from(xdg_config_home));
        }
    }
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Path of the global config file, if a config home can be determined
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|home| home.join("norns-edit").join("config.toml"))
}
