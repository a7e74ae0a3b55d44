//! Script Catalog
//!
//! A JSON document listing installable script projects, keyed by project
//! name. Read with [`Catalog::load`] and written with [`Catalog::store`].

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// One project recorded in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub origin: String,
    pub project_name: String,
    pub author: String,
    pub url: String,
}

/// File type and schema version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub kind: String,
}

pub const CATALOG_VERSION: u32 = 1;
pub const CATALOG_KIND: &str = "script_catalog";

impl Default for Header {
    fn default() -> Self {
        Self {
            version: CATALOG_VERSION,
            kind: CATALOG_KIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "file_info")]
    header: Header,
    entries: BTreeMap<String, Entry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog. The header is kept as found; it is checked on store.
    pub fn load<R: Read>(reader: R) -> Result<Self, ApiError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the catalog as JSON; refuses catalogs of another version or kind
    pub fn store<W: Write>(&self, writer: W) -> Result<(), ApiError> {
        if self.header != Header::default() {
            return Err(ApiError::CatalogError(
                "catalog header version/kind does not match".to_string(),
            ));
        }
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Add `entry`, replacing any entry with the same project name
    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.project_name.clone(), entry);
    }

    /// All entries, ordered by project name
    pub fn entries(&self) -> Vec<&Entry> {
        self.entries.values().collect()
    }

    pub fn get(&self, project_name: &str) -> Option<&Entry> {
        self.entries.get(project_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
