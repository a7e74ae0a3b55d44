//! Core types shared by the tree, buffer cache, explorer, and view builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// ResourceKey: path-like identifier of a remote resource (e.g. `/scripts/foo/foo.lua`)
pub type ResourceKey = String;

/// Root category of the remote hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Scripts,
    Data,
    Audio,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Scripts, Category::Data, Category::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Scripts => "scripts",
            Category::Data => "data",
            Category::Audio => "audio",
        }
    }

    /// Key prefix under which this category's resources live
    pub fn root_key(&self) -> ResourceKey {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::error::ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scripts" | "code" => Ok(Category::Scripts),
            "data" => Ok(Category::Data),
            "audio" => Ok(Category::Audio),
            other => Err(crate::error::ApiError::NotFound(format!(
                "unknown category '{}'",
                other
            ))),
        }
    }
}

/// Generation: stamp identifying one version of a store's contents.
///
/// Stamps come from a single process-wide counter, so two distinct store
/// versions never share a stamp even across separate state containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

impl Generation {
    pub fn next() -> Self {
        Generation(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::next()
    }
}
