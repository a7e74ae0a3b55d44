//! Host transports
//!
//! [`Transport`] is the seam to the remote host. Two hosts ship with the
//! crate: an in-memory one used by tests and demos, and one backed by a
//! dust-style directory on the local filesystem.
//!
//! Keys handed out by both hosts take the form `/<category>/<relative path>`,
//! with the category directory on the host named by [`category_dir`].

mod contract;
pub mod local;
pub mod memory;

pub use contract::Transport;
pub use local::LocalTransport;
pub use memory::MemoryTransport;

use crate::types::Category;

/// Directory under the dust root holding a category's files
pub fn category_dir(category: Category) -> &'static str {
    match category {
        Category::Scripts => "code",
        Category::Data => "data",
        Category::Audio => "audio",
    }
}

/// Split a key into its category and the path relative to the category root
pub fn split_key(key: &str) -> Option<(Category, &str)> {
    let rest = key.strip_prefix('/')?;
    let (head, tail) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };
    let category = Category::ALL.into_iter().find(|c| c.as_str() == head)?;
    Some((category, tail))
}
