//! In-memory host
//!
//! Holds a flat map of keys to files and directories. Counts every call and
//! supports injected failures and held requests, which is what the session
//! tests lean on to exercise dedupe and completion ordering.

use super::{category_dir, contract::Transport, split_key};
use crate::error::TransportError;
use crate::key;
use crate::tree::ResourceNode;
use crate::types::Category;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    File(String),
    Directory,
}

/// Device path prefix reported by [`MemoryTransport::path_for_resource`]
pub const DUST_ROOT: &str = "/home/we/dust";

#[derive(Default)]
pub struct MemoryTransport {
    entries: Mutex<BTreeMap<String, Entry>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let host = Self::default();
        {
            let mut entries = host.entries.lock();
            for category in Category::ALL {
                entries.insert(category.root_key(), Entry::Directory);
            }
        }
        host
    }

    /// Add a file, creating missing parent directories
    pub fn with_file(self, key: &str, content: &str) -> Self {
        self.put_file(key, content);
        self
    }

    pub fn with_directory(self, key: &str) -> Self {
        self.ensure_parents(key);
        self.entries
            .lock()
            .insert(key.to_string(), Entry::Directory);
        self
    }

    pub fn put_file(&self, key: &str, content: &str) {
        self.ensure_parents(key);
        self.entries
            .lock()
            .insert(key.to_string(), Entry::File(content.to_string()));
    }

    /// Current content of a file on the host
    pub fn file(&self, key: &str) -> Option<String> {
        match self.entries.lock().get(key) {
            Some(Entry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Number of times `op` (a trait method name) was invoked
    pub fn call_count(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or(0)
    }

    /// Make every later call to `op` fail with `Rejected`
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().insert(op);
    }

    pub fn succeed_on(&self, op: &'static str) {
        self.failing.lock().remove(op);
    }

    /// Hold requests matching `label` until [`release`](Self::release) is called.
    ///
    /// Labels are `read:<key>` for reads, `write:<content>` for writes and
    /// `rename:<key>` for renames.
    pub fn hold(&self, label: &str) {
        self.gates
            .lock()
            .insert(label.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held request matching `label` through
    pub fn release(&self, label: &str) {
        if let Some(gate) = self.gates.lock().get(label) {
            gate.add_permits(1);
        }
    }

    fn ensure_parents(&self, key: &str) {
        let mut entries = self.entries.lock();
        let mut current = key::parent(key);
        while let Some(dir) = current {
            if dir.is_empty() {
                break;
            }
            entries
                .entry(dir.to_string())
                .or_insert(Entry::Directory);
            current = key::parent(dir);
        }
    }

    async fn enter(&self, op: &'static str, label: Option<String>) -> Result<(), TransportError> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        let gate = label.and_then(|l| self.gates.lock().get(&l).cloned());
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        // every request suspends at least once, like a real round trip
        tokio::task::yield_now().await;
        if self.failing.lock().contains(op) {
            return Err(TransportError::Rejected(format!("{} refused", op)));
        }
        Ok(())
    }

    fn children_of(entries: &BTreeMap<String, Entry>, dir: &str) -> Vec<ResourceNode> {
        entries
            .iter()
            .filter(|(k, _)| key::parent(k) == Some(dir))
            .map(|(k, entry)| Self::node(entries, k, entry))
            .collect()
    }

    fn node(entries: &BTreeMap<String, Entry>, k: &str, entry: &Entry) -> ResourceNode {
        match entry {
            Entry::File(_) => ResourceNode::leaf(k, key::file_name(k)),
            Entry::Directory => {
                ResourceNode::directory(k, key::file_name(k), Self::children_of(entries, k))
            }
        }
    }

    fn sibling_name(entries: &BTreeMap<String, Entry>, dir: &str, desired: &str) -> String {
        key::unique_name(desired, |name| entries.contains_key(&key::join(dir, name)))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn list_root(&self, category: Category) -> Result<Vec<ResourceNode>, TransportError> {
        self.enter("list_root", None).await?;
        let entries = self.entries.lock();
        Ok(Self::children_of(&entries, &category.root_key()))
    }

    async fn list_directory(&self, dir: &str) -> Result<Vec<ResourceNode>, TransportError> {
        self.enter("list_directory", None).await?;
        let entries = self.entries.lock();
        match entries.get(dir) {
            Some(Entry::Directory) => Ok(Self::children_of(&entries, dir)),
            Some(Entry::File(_)) => Err(TransportError::Rejected(format!(
                "'{}' is not a directory",
                dir
            ))),
            None => Err(TransportError::Missing(dir.to_string())),
        }
    }

    async fn read_resource(&self, k: &str) -> Result<String, TransportError> {
        self.enter("read_resource", Some(format!("read:{}", k)))
            .await?;
        match self.entries.lock().get(k) {
            Some(Entry::File(content)) => Ok(content.clone()),
            Some(Entry::Directory) => Err(TransportError::Rejected(format!(
                "'{}' is a directory",
                k
            ))),
            None => Err(TransportError::Missing(k.to_string())),
        }
    }

    async fn write_resource(&self, k: &str, content: &str) -> Result<(), TransportError> {
        self.enter("write_resource", Some(format!("write:{}", content)))
            .await?;
        if matches!(self.entries.lock().get(k), Some(Entry::Directory)) {
            return Err(TransportError::Rejected(format!("'{}' is a directory", k)));
        }
        self.put_file(k, content);
        Ok(())
    }

    async fn create_resource(
        &self,
        sibling: &str,
        value: &str,
    ) -> Result<ResourceNode, TransportError> {
        self.enter("create_resource", None).await?;
        let mut entries = self.entries.lock();
        if !entries.contains_key(sibling) {
            return Err(TransportError::Missing(sibling.to_string()));
        }
        let dir = key::parent(sibling)
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", sibling)))?;
        let name = Self::sibling_name(&entries, dir, key::NEW_SCRIPT_NAME);
        let created = key::join(dir, &name);
        entries.insert(created.clone(), Entry::File(value.to_string()));
        Ok(ResourceNode::leaf(created, name))
    }

    async fn duplicate_resource(&self, source: &str) -> Result<ResourceNode, TransportError> {
        self.enter("duplicate_resource", None).await?;
        let mut entries = self.entries.lock();
        let content = match entries.get(source) {
            Some(Entry::File(content)) => content.clone(),
            Some(Entry::Directory) => {
                return Err(TransportError::Rejected(format!(
                    "cannot duplicate directory '{}'",
                    source
                )))
            }
            None => return Err(TransportError::Missing(source.to_string())),
        };
        let dir = key::parent(source)
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", source)))?;
        let name = Self::sibling_name(&entries, dir, &key::copy_name(key::file_name(source)));
        let copy = key::join(dir, &name);
        entries.insert(copy.clone(), Entry::File(content));
        Ok(ResourceNode::leaf(copy, name))
    }

    async fn delete_resource(&self, k: &str) -> Result<(), TransportError> {
        self.enter("delete_resource", None).await?;
        let mut entries = self.entries.lock();
        if entries.remove(k).is_none() {
            return Err(TransportError::Missing(k.to_string()));
        }
        entries.retain(|existing, _| !key::is_descendant(existing, k));
        Ok(())
    }

    async fn rename_resource(
        &self,
        k: &str,
        new_name: &str,
    ) -> Result<ResourceNode, TransportError> {
        self.enter("rename_resource", Some(format!("rename:{}", k)))
            .await?;
        let mut entries = self.entries.lock();
        if !entries.contains_key(k) {
            return Err(TransportError::Missing(k.to_string()));
        }
        let dir = key::parent(k)
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", k)))?;
        let target = key::join(dir, new_name);
        if target != k && entries.contains_key(&target) {
            return Err(TransportError::Rejected(format!("'{}' already exists", target)));
        }
        let moving: Vec<String> = entries
            .keys()
            .filter(|existing| key::rebase(existing, k, &target).is_some())
            .cloned()
            .collect();
        for old in moving {
            if let (Some(entry), Some(new)) = (entries.remove(&old), key::rebase(&old, k, &target)) {
                entries.insert(new, entry);
            }
        }
        let entry = entries.get(&target).cloned().unwrap_or(Entry::Directory);
        Ok(Self::node(&entries, &target, &entry))
    }

    fn path_for_resource(&self, k: &str) -> String {
        match split_key(k) {
            Some((category, rel)) if rel.is_empty() => {
                format!("{}/{}", DUST_ROOT, category_dir(category))
            }
            Some((category, rel)) => format!("{}/{}/{}", DUST_ROOT, category_dir(category), rel),
            None => format!("{}{}", DUST_ROOT, k),
        }
    }
}
