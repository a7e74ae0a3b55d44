//! Explorer UI state: expanded nodes and the active (selected) resource.

use crate::key;
use crate::types::{Generation, ResourceKey};
use std::collections::HashSet;

/// Expanded node keys plus the single active key
///
/// Neither field is validated against the tree: selection may precede a
/// listing, and keys left behind by deletes or reloads are kept.
#[derive(Debug, Clone, Default)]
pub struct ExplorerState {
    expanded: HashSet<ResourceKey>,
    active: Option<ResourceKey>,
    generation: Generation,
}

impl ExplorerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.as_deref() == Some(key)
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    pub fn expanded(&self) -> impl Iterator<Item = &ResourceKey> {
        self.expanded.iter()
    }

    pub fn set_active(&mut self, key: &str) {
        if !self.is_active(key) {
            self.active = Some(key.to_string());
            self.touch();
        }
    }

    pub fn clear_active(&mut self) {
        if self.active.take().is_some() {
            self.touch();
        }
    }

    pub fn toggle(&mut self, key: &str, expanded: bool) {
        let changed = if expanded {
            self.expanded.insert(key.to_string())
        } else {
            self.expanded.remove(key)
        };
        if changed {
            self.touch();
        }
    }

    /// Follow a rename: active and expanded keys at or below `old` move to `new`
    pub fn rekey(&mut self, old: &str, new: &str) {
        let mut changed = false;
        if let Some(active) = self.active.as_deref() {
            if let Some(rebased) = key::rebase(active, old, new) {
                self.active = Some(rebased);
                changed = true;
            }
        }
        let moving: Vec<ResourceKey> = self
            .expanded
            .iter()
            .filter(|k| key::rebase(k, old, new).is_some())
            .cloned()
            .collect();
        for k in moving {
            self.expanded.remove(&k);
            if let Some(rebased) = key::rebase(&k, old, new) {
                self.expanded.insert(rebased);
            }
            changed = true;
        }
        if changed {
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.generation = Generation::next();
    }
}
