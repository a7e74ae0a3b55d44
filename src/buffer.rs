//! Buffer Cache
//!
//! Maps a resource key to its locally loaded content plus a dirty flag.
//! Independent of the resource tree: a buffer may outlive a reload that no
//! longer lists its resource.

use crate::key;
use crate::types::{Generation, ResourceKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Locally cached, possibly edited, content of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    pub content: String,
    /// True iff `content` diverges from the last value known to be persisted
    pub modified: bool,
}

impl Buffer {
    pub fn clean(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            modified: false,
        }
    }
}

/// A key that stopped naming its resource
#[derive(Debug, Clone, PartialEq, Eq)]
enum Relocation {
    Moved { from: ResourceKey, to: ResourceKey },
    Removed(ResourceKey),
}

/// Buffer index: ResourceKey -> Buffer
///
/// Renames and deletes are logged while any lease is open, so a request
/// that started before them can find where its key went.
#[derive(Debug, Clone, Default)]
pub struct BufferCache {
    buffers: HashMap<ResourceKey, Buffer>,
    generation: Generation,
    relocations: Vec<(u64, Relocation)>,
    next_seq: u64,
    leases: BTreeMap<u64, usize>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn get(&self, key: &str) -> Option<&Buffer> {
        self.buffers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.buffers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.buffers.keys()
    }

    /// Install content fetched from the host.
    ///
    /// An existing buffer wins: a local edit made while the fetch was in
    /// flight must not be clobbered. Returns the buffer now cached.
    pub fn install_loaded(&mut self, key: &str, content: String) -> Buffer {
        if let Some(existing) = self.buffers.get(key) {
            return existing.clone();
        }
        let buffer = Buffer::clean(content);
        self.buffers.insert(key.to_string(), buffer.clone());
        self.touch();
        buffer
    }

    /// Record a local edit; valid even if the resource was never read
    pub fn change(&mut self, key: &str, content: String) {
        let buffer = Buffer {
            content,
            modified: true,
        };
        if self.buffers.get(key) != Some(&buffer) {
            self.buffers.insert(key.to_string(), buffer);
            self.touch();
        }
    }

    /// Record a completed save of `content`
    pub fn mark_saved(&mut self, key: &str, content: String) {
        let buffer = Buffer::clean(content);
        if self.buffers.get(key) != Some(&buffer) {
            self.buffers.insert(key.to_string(), buffer);
            self.touch();
        }
    }

    /// Record a failed save; the buffer stays (or becomes) modified.
    ///
    /// A dirty buffer keeps its newer local edit; otherwise the buffer takes
    /// the content that failed to persist.
    pub fn mark_save_failed(&mut self, key: &str, content: String) {
        match self.buffers.get_mut(key) {
            Some(buffer) if buffer.modified => return,
            Some(buffer) => {
                buffer.content = content;
                buffer.modified = true;
            }
            None => {
                self.buffers.insert(
                    key.to_string(),
                    Buffer {
                        content,
                        modified: true,
                    },
                );
            }
        }
        self.touch();
    }

    /// Open a lease before starting a remote request; pass the mark to
    /// [`settle`](Self::settle) or [`release`](Self::release) when it ends.
    pub fn lease(&mut self) -> u64 {
        let mark = self.next_seq;
        *self.leases.entry(mark).or_insert(0) += 1;
        mark
    }

    /// Close a lease, reporting where `key` lives now.
    ///
    /// `None` when the resource was deleted after the lease was opened.
    pub fn settle(&mut self, key: &str, mark: u64) -> Option<ResourceKey> {
        let resolved = self.resolve(key, mark);
        self.release(mark);
        resolved
    }

    /// Close a lease without resolving anything
    pub fn release(&mut self, mark: u64) {
        if let Some(count) = self.leases.get_mut(&mark) {
            *count -= 1;
            if *count == 0 {
                self.leases.remove(&mark);
            }
        }
        match self.leases.keys().next().copied() {
            Some(oldest) => self.relocations.retain(|(seq, _)| *seq >= oldest),
            None => self.relocations.clear(),
        }
    }

    fn resolve(&self, key: &str, mark: u64) -> Option<ResourceKey> {
        let mut current = key.to_string();
        for (_, relocation) in self.relocations.iter().filter(|(seq, _)| *seq >= mark) {
            match relocation {
                Relocation::Moved { from, to } => {
                    if let Some(rebased) = key::rebase(&current, from, to) {
                        current = rebased;
                    }
                }
                Relocation::Removed(gone) => {
                    if current == *gone || key::is_descendant(&current, gone) {
                        return None;
                    }
                }
            }
        }
        Some(current)
    }

    fn log(&mut self, relocation: Relocation) {
        if !self.leases.is_empty() {
            self.relocations.push((self.next_seq, relocation));
        }
        self.next_seq += 1;
    }

    /// Drop the buffer at `key` and any buffers below it. Returns the count removed.
    pub fn evict(&mut self, key: &str) -> usize {
        self.log(Relocation::Removed(key.to_string()));
        let before = self.buffers.len();
        self.buffers
            .retain(|k, _| k != key && !key::is_descendant(k, key));
        let removed = before - self.buffers.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Move the buffer at `old` (and any below it) to `new`. Returns the count moved.
    pub fn migrate(&mut self, old: &str, new: &str) -> usize {
        if old == new {
            return 0;
        }
        self.log(Relocation::Moved {
            from: old.to_string(),
            to: new.to_string(),
        });
        let moving: Vec<ResourceKey> = self
            .buffers
            .keys()
            .filter(|k| key::rebase(k, old, new).is_some())
            .cloned()
            .collect();
        for k in &moving {
            if let (Some(buffer), Some(target)) = (self.buffers.remove(k), key::rebase(k, old, new))
            {
                self.buffers.insert(target, buffer);
            }
        }
        if !moving.is_empty() {
            self.touch();
        }
        moving.len()
    }

    fn touch(&mut self) {
        self.generation = Generation::next();
    }
}
