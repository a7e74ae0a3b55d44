//! Resource tree: one ordered forest per root category.

use super::node::{collect_keys, count_nodes, find_in, find_mut_in, locate_mut, ResourceNode};
use crate::error::ApiError;
use crate::key;
use crate::types::{Category, Generation, ResourceKey};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Client-side mirror of the remote hierarchy
///
/// Keys are unique across every category. Every successful mutation stamps a
/// fresh [`Generation`]; a failed one leaves both the forest and the stamp
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    roots: BTreeMap<Category, Vec<ResourceNode>>,
    generation: Generation,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Replace the forest for `category` with a fresh listing.
    ///
    /// Explorer and buffer state referring to keys that disappear are left
    /// alone.
    pub fn load(&mut self, category: Category, snapshot: Vec<ResourceNode>) -> Result<(), ApiError> {
        let mut incoming = Vec::new();
        collect_keys(&snapshot, &mut incoming);

        let mut seen = HashSet::with_capacity(incoming.len());
        for k in &incoming {
            if !seen.insert(k.as_str()) {
                return Err(ApiError::Conflict(format!(
                    "duplicate key '{}' in {} listing",
                    k, category
                )));
            }
        }
        for (other, nodes) in &self.roots {
            if *other == category {
                continue;
            }
            if let Some(k) = incoming.iter().find(|k| find_in(nodes, k).is_some()) {
                return Err(ApiError::Conflict(format!(
                    "key '{}' already present under {}",
                    k, other
                )));
            }
        }

        debug!(category = %category, nodes = incoming.len(), "Loaded resource listing");
        self.roots.insert(category, snapshot);
        self.touch();
        Ok(())
    }

    /// Insert `node` directly after the node at `sibling_key`
    pub fn insert(&mut self, sibling_key: &str, node: ResourceNode) -> Result<(), ApiError> {
        self.ensure_absent(&node)?;
        let (list, idx) = self
            .locate(sibling_key)
            .ok_or_else(|| ApiError::NotFound(sibling_key.to_string()))?;
        list.insert(idx + 1, node);
        self.touch();
        Ok(())
    }

    /// Append `node` as the last child of the directory at `parent_key`
    pub fn insert_child(&mut self, parent_key: &str, node: ResourceNode) -> Result<(), ApiError> {
        self.ensure_absent(&node)?;
        let parent = self
            .find_mut(parent_key)
            .ok_or_else(|| ApiError::NotFound(parent_key.to_string()))?;
        parent.children.get_or_insert_with(Vec::new).push(node);
        self.touch();
        Ok(())
    }

    /// Delete the subtree rooted at `key`, returning it
    pub fn remove(&mut self, key: &str) -> Result<ResourceNode, ApiError> {
        let (list, idx) = self
            .locate(key)
            .ok_or_else(|| ApiError::NotFound(key.to_string()))?;
        let removed = list.remove(idx);
        self.touch();
        Ok(removed)
    }

    /// Re-key and re-label a node.
    ///
    /// Descendants whose keys carry `old_key` as a path prefix move with it;
    /// descendants keyed some other way keep their keys.
    pub fn rename(&mut self, old_key: &str, new_key: &str, new_label: &str) -> Result<(), ApiError> {
        let moving: HashSet<ResourceKey> = self
            .find(old_key)
            .ok_or_else(|| ApiError::NotFound(old_key.to_string()))?
            .subtree_keys()
            .into_iter()
            .collect();
        let targets = moving
            .iter()
            .map(|k| key::rebase(k, old_key, new_key).unwrap_or_else(|| k.clone()));
        for target in targets {
            if !moving.contains(&target) && self.contains(&target) {
                return Err(ApiError::Conflict(format!("'{}' already exists", target)));
            }
        }
        let node = self
            .find_mut(old_key)
            .ok_or_else(|| ApiError::NotFound(old_key.to_string()))?;
        node.key = new_key.to_string();
        node.label = new_label.to_string();
        if let Some(children) = node.children.as_mut() {
            rebase_all(children, old_key, new_key);
        }
        self.touch();
        Ok(())
    }

    /// Replace the children of the directory at `key` with a fresh listing
    pub fn replace_children(
        &mut self,
        key: &str,
        children: Vec<ResourceNode>,
    ) -> Result<(), ApiError> {
        let current = self
            .find(key)
            .ok_or_else(|| ApiError::NotFound(key.to_string()))?;
        let replaced: HashSet<ResourceKey> = current.subtree_keys().into_iter().collect();

        let mut incoming = Vec::new();
        collect_keys(&children, &mut incoming);
        let mut seen = HashSet::with_capacity(incoming.len());
        for k in &incoming {
            if k == key || !seen.insert(k.as_str()) || (self.contains(k) && !replaced.contains(k)) {
                return Err(ApiError::Conflict(format!(
                    "key '{}' already present in tree",
                    k
                )));
            }
        }

        if let Some(node) = self.find_mut(key) {
            node.children = Some(children);
        }
        self.touch();
        Ok(())
    }

    pub fn find(&self, key: &str) -> Option<&ResourceNode> {
        self.roots.values().find_map(|nodes| find_in(nodes, key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Category whose forest holds `key`
    pub fn category_of(&self, key: &str) -> Option<Category> {
        self.roots
            .iter()
            .find(|(_, nodes)| find_in(nodes, key).is_some())
            .map(|(category, _)| *category)
    }

    pub fn roots(&self, category: Category) -> Option<&[ResourceNode]> {
        self.roots.get(&category).map(Vec::as_slice)
    }

    /// Loaded forests in category order
    pub fn forests(&self) -> impl Iterator<Item = (Category, &[ResourceNode])> {
        self.roots.iter().map(|(c, nodes)| (*c, nodes.as_slice()))
    }

    /// Siblings of `key` (including itself)
    pub fn siblings(&self, key: &str) -> Option<&[ResourceNode]> {
        for nodes in self.roots.values() {
            if nodes.iter().any(|n| n.key == key) {
                return Some(nodes);
            }
            if let Some(list) = siblings_in(nodes, key) {
                return Some(list);
            }
        }
        None
    }

    /// All keys, pre-order, category by category
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys = Vec::new();
        for nodes in self.roots.values() {
            collect_keys(nodes, &mut keys);
        }
        keys
    }

    pub fn node_count(&self) -> usize {
        self.roots.values().map(|nodes| count_nodes(nodes)).sum()
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut ResourceNode> {
        self.roots
            .values_mut()
            .find_map(|nodes| find_mut_in(nodes, key))
    }

    fn locate(&mut self, key: &str) -> Option<(&mut Vec<ResourceNode>, usize)> {
        self.roots
            .values_mut()
            .find_map(|nodes| locate_mut(nodes, key))
    }

    fn ensure_absent(&self, node: &ResourceNode) -> Result<(), ApiError> {
        match node.subtree_keys().into_iter().find(|k| self.contains(k)) {
            Some(k) => Err(ApiError::Conflict(format!("'{}' already exists", k))),
            None => Ok(()),
        }
    }

    fn touch(&mut self) {
        self.generation = Generation::next();
    }
}

fn siblings_in<'a>(nodes: &'a [ResourceNode], key: &str) -> Option<&'a [ResourceNode]> {
    for node in nodes {
        if let Some(children) = node.children.as_deref() {
            if children.iter().any(|c| c.key == key) {
                return Some(children);
            }
            if let Some(found) = siblings_in(children, key) {
                return Some(found);
            }
        }
    }
    None
}

fn rebase_all(nodes: &mut [ResourceNode], old: &str, new: &str) {
    for node in nodes {
        if let Some(rebased) = key::rebase(&node.key, old, new) {
            node.key = rebased;
        }
        if let Some(children) = node.children.as_mut() {
            rebase_all(children, old, new);
        }
    }
}
