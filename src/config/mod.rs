//! Configuration
//!
//! Layered configuration for the edit engine and its CLI: built-in defaults,
//! a global file, a workspace file, then `NORNS_EDIT__*` environment
//! variables, highest last.

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;
pub use paths::{config_home, global_config_path, WORKSPACE_CONFIG_FILE};

use crate::logging::LoggingConfig;
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the host's resources live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Dust directory served by the local transport; relative paths resolve
    /// against the workspace root
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Display name of the host
    #[serde(default = "default_host_name")]
    pub name: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_host_name() -> String {
    "norns".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            name: default_host_name(),
        }
    }
}

impl HostConfig {
    pub fn resolve_root(&self, workspace_root: &Path) -> PathBuf {
        if self.root.is_absolute() {
            self.root.clone()
        } else {
            workspace_root.join(&self.root)
        }
    }
}

/// Explorer defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Categories listed when no category is named
    #[serde(default = "default_preload")]
    pub preload: Vec<Category>,
}

fn default_preload() -> Vec<Category> {
    vec![Category::Scripts]
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            preload: default_preload(),
        }
    }
}
