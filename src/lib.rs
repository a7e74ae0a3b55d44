//! norns-edit: resource explorer and buffer engine for a norns host
//!
//! Mirrors the scripts, data, and audio trees of a remote host, caches the
//! content of opened resources as editable buffers, tracks explorer state,
//! and derives a render-ready annotated view. All host traffic goes through a
//! [`Transport`](transport::Transport); runtime commands go through a
//! [`CommandChannel`](channel::CommandChannel).

pub mod buffer;
pub mod catalog;
pub mod channel;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod explorer;
pub mod key;
pub mod logging;
pub mod session;
pub mod state;
pub mod tooling;
pub mod transport;
pub mod tree;
pub mod types;
pub mod views;

pub use buffer::{Buffer, BufferCache};
pub use error::{ApiError, TransportError};
pub use explorer::ExplorerState;
pub use session::EditSession;
pub use state::EditState;
pub use tree::{ResourceNode, ResourceTree};
pub use types::{Category, Generation, ResourceKey};
pub use views::{AnnotatedForest, AnnotatedNode, ViewBuilder};
