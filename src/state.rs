//! Edit state container
//!
//! Groups the three independent stores the view builder joins. The session
//! owns one behind a lock and is the only writer.

use crate::buffer::BufferCache;
use crate::explorer::ExplorerState;
use crate::tree::ResourceTree;
use crate::types::Generation;

#[derive(Debug, Clone, Default)]
pub struct EditState {
    pub tree: ResourceTree,
    pub buffers: BufferCache,
    pub explorer: ExplorerState,
}

/// Generation stamps of all three stores at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateStamp {
    pub tree: Generation,
    pub buffers: Generation,
    pub explorer: Generation,
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&self) -> StateStamp {
        StateStamp {
            tree: self.tree.generation(),
            buffers: self.buffers.generation(),
            explorer: self.explorer.generation(),
        }
    }
}
