//! Host transport contract.
//!
//! Everything the edit engine needs from the remote host. The wire protocol
//! behind it is up to the implementation.

use crate::error::TransportError;
use crate::tree::ResourceNode;
use crate::types::Category;
use async_trait::async_trait;

/// Asynchronous access to the remote host's resource hierarchy.
///
/// Implementations must not retry on their own behalf in a way that would
/// duplicate writes; the engine issues each call at most once per intent.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Full listing of one root category
    async fn list_root(&self, category: Category) -> Result<Vec<ResourceNode>, TransportError>;

    /// Children of the directory at `key`
    async fn list_directory(&self, key: &str) -> Result<Vec<ResourceNode>, TransportError>;

    async fn read_resource(&self, key: &str) -> Result<String, TransportError>;

    async fn write_resource(&self, key: &str, content: &str) -> Result<(), TransportError>;

    /// Create a new script next to `sibling` holding `value`; returns the created node
    async fn create_resource(
        &self,
        sibling: &str,
        value: &str,
    ) -> Result<ResourceNode, TransportError>;

    /// Copy `source` next to itself; returns the copy
    async fn duplicate_resource(&self, source: &str) -> Result<ResourceNode, TransportError>;

    async fn delete_resource(&self, key: &str) -> Result<(), TransportError>;

    /// Rename `key` within its directory; returns the node under its new key
    async fn rename_resource(
        &self,
        key: &str,
        new_name: &str,
    ) -> Result<ResourceNode, TransportError>;

    /// Path of the resource as the host's script runtime sees it
    fn path_for_resource(&self, key: &str) -> String;
}
