//! Explorer Views
//!
//! Joins the resource tree, buffer cache, and explorer state into a
//! render-ready annotated forest plus an active-node lookup. Both results are
//! memoized on store generations so unchanged inputs hand back the same `Arc`.

use crate::buffer::BufferCache;
use crate::explorer::ExplorerState;
use crate::state::{EditState, StateStamp};
use crate::tree::ResourceNode;
use crate::types::{Category, Generation, ResourceKey};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

/// A resource node annotated with explorer and buffer state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedNode {
    pub key: ResourceKey,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<AnnotatedNode>>,
    /// Key equals the active key
    pub active: bool,
    /// Key is expanded
    pub toggled: bool,
    /// A buffer is cached for the key
    pub loaded: bool,
    /// Buffer is dirty; false when not loaded
    pub modified: bool,
}

/// Annotated forest of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedRoot {
    pub category: Category,
    pub nodes: Vec<AnnotatedNode>,
}

/// Annotated forests of every loaded category, in category order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotatedForest {
    pub roots: Vec<AnnotatedRoot>,
}

impl AnnotatedForest {
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|r| count(&r.nodes)).sum()
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys = Vec::new();
        for root in &self.roots {
            collect(&root.nodes, &mut keys);
        }
        keys
    }

    pub fn find(&self, key: &str) -> Option<&AnnotatedNode> {
        self.roots.iter().find_map(|r| find(&r.nodes, key))
    }
}

fn count(nodes: &[AnnotatedNode]) -> usize {
    nodes
        .iter()
        .map(|n| 1 + n.children.as_deref().map(count).unwrap_or(0))
        .sum()
}

fn collect(nodes: &[AnnotatedNode], out: &mut Vec<ResourceKey>) {
    for node in nodes {
        out.push(node.key.clone());
        if let Some(children) = &node.children {
            collect(children, out);
        }
    }
}

fn find<'a>(nodes: &'a [AnnotatedNode], key: &str) -> Option<&'a AnnotatedNode> {
    nodes.iter().find_map(|n| {
        if n.key == key {
            Some(n)
        } else {
            n.children.as_deref().and_then(|c| find(c, key))
        }
    })
}

/// Annotate `nodes` recursively; shape and ordering are preserved
pub fn annotate(
    nodes: &[ResourceNode],
    buffers: &BufferCache,
    explorer: &ExplorerState,
) -> Vec<AnnotatedNode> {
    nodes
        .iter()
        .map(|node| {
            let buffer = buffers.get(&node.key);
            AnnotatedNode {
                key: node.key.clone(),
                label: node.label.clone(),
                children: node
                    .children
                    .as_deref()
                    .map(|children| annotate(children, buffers, explorer)),
                active: explorer.is_active(&node.key),
                toggled: explorer.is_expanded(&node.key),
                loaded: buffer.is_some(),
                modified: buffer.map(|b| b.modified).unwrap_or(false),
            }
        })
        .collect()
}

/// Build the full annotated forest without memoization
pub fn build_forest(state: &EditState) -> AnnotatedForest {
    AnnotatedForest {
        roots: state
            .tree
            .forests()
            .map(|(category, nodes)| AnnotatedRoot {
                category,
                nodes: annotate(nodes, &state.buffers, &state.explorer),
            })
            .collect(),
    }
}

type ActiveKey = (Generation, Option<ResourceKey>);

/// Memoizing view builder
///
/// Holds the last result of each selector with the input stamps it was
/// computed from.
#[derive(Default)]
pub struct ViewBuilder {
    forest: Mutex<Option<(StateStamp, Arc<AnnotatedForest>)>>,
    active: Mutex<Option<(ActiveKey, Option<Arc<ResourceNode>>)>>,
}

impl ViewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotated forest; recomputed only when a store generation moved
    pub fn annotated_forest(&self, state: &EditState) -> Arc<AnnotatedForest> {
        let stamp = state.stamp();
        let mut cached = self.forest.lock();
        if let Some((last, forest)) = cached.as_ref() {
            if *last == stamp {
                return Arc::clone(forest);
            }
        }
        trace!(
            tree = stamp.tree.value(),
            buffers = stamp.buffers.value(),
            explorer = stamp.explorer.value(),
            "Rebuilding annotated forest"
        );
        let forest = Arc::new(build_forest(state));
        *cached = Some((stamp, Arc::clone(&forest)));
        forest
    }

    /// Node whose key equals the active key, if it is in the tree
    pub fn active_node(&self, state: &EditState) -> Option<Arc<ResourceNode>> {
        let input: ActiveKey = (
            state.tree.generation(),
            state.explorer.active().map(str::to_string),
        );
        let mut cached = self.active.lock();
        if let Some((last, node)) = cached.as_ref() {
            if *last == input {
                return node.clone();
            }
        }
        let node = input
            .1
            .as_deref()
            .and_then(|key| state.tree.find(key))
            .cloned()
            .map(Arc::new);
        *cached = Some((input, node.clone()));
        node
    }
}
