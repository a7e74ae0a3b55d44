//! Resource node type and slice-level traversal helpers

use crate::types::ResourceKey;
use serde::{Deserialize, Serialize};

/// A file or directory on the remote host
///
/// `children` is present only for directory-like nodes; `None` means leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub key: ResourceKey,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ResourceNode>>,
}

impl ResourceNode {
    pub fn leaf(key: impl Into<ResourceKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children: None,
        }
    }

    pub fn directory(
        key: impl Into<ResourceKey>,
        label: impl Into<String>,
        children: Vec<ResourceNode>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            children: Some(children),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.children.is_some()
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .as_deref()
            .map(count_nodes)
            .unwrap_or(0)
    }

    /// Pre-order keys of this subtree
    pub fn subtree_keys(&self) -> Vec<ResourceKey> {
        let mut keys = Vec::new();
        collect_keys(std::slice::from_ref(self), &mut keys);
        keys
    }
}

pub(crate) fn count_nodes(nodes: &[ResourceNode]) -> usize {
    nodes.iter().map(ResourceNode::subtree_len).sum()
}

pub(crate) fn collect_keys(nodes: &[ResourceNode], out: &mut Vec<ResourceKey>) {
    for node in nodes {
        out.push(node.key.clone());
        if let Some(children) = &node.children {
            collect_keys(children, out);
        }
    }
}

pub(crate) fn find_in<'a>(nodes: &'a [ResourceNode], key: &str) -> Option<&'a ResourceNode> {
    for node in nodes {
        if node.key == key {
            return Some(node);
        }
        if let Some(found) = node.children.as_deref().and_then(|c| find_in(c, key)) {
            return Some(found);
        }
    }
    None
}

pub(crate) fn find_mut_in<'a>(
    nodes: &'a mut [ResourceNode],
    key: &str,
) -> Option<&'a mut ResourceNode> {
    for node in nodes.iter_mut() {
        if node.key == key {
            return Some(node);
        }
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = find_mut_in(children, key) {
                return Some(found);
            }
        }
    }
    None
}

/// Find the list holding `key` and its index within that list
pub(crate) fn locate_mut<'a>(
    nodes: &'a mut Vec<ResourceNode>,
    key: &str,
) -> Option<(&'a mut Vec<ResourceNode>, usize)> {
    if let Some(idx) = nodes.iter().position(|n| n.key == key) {
        return Some((nodes, idx));
    }
    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = locate_mut(children, key) {
                return Some(found);
            }
        }
    }
    None
}
