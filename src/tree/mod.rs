//! Resource Tree Model
//!
//! Mirrors the remote host's scripts/data/audio hierarchy as an ordered
//! forest of [`ResourceNode`]s, one forest per [`crate::types::Category`].

mod forest;
mod node;

pub use forest::ResourceTree;
pub use node::ResourceNode;
