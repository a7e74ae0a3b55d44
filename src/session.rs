//! Edit Session
//!
//! The command surface. Every intent that mutates the resource tree, buffer
//! cache, or explorer state goes through here: remote calls are awaited
//! first, then the result is applied to the shared [`EditState`] in a single
//! short critical section. The state lock is never held across an await.

use crate::buffer::{Buffer, BufferCache};
use crate::channel::{script_load_command, CommandChannel, MATRON_COMPONENT};
use crate::concurrency::InFlight;
use crate::error::ApiError;
use crate::key;
use crate::state::EditState;
use crate::transport::{self, Transport};
use crate::tree::ResourceNode;
use crate::types::{Category, ResourceKey};
use crate::views::{AnnotatedForest, ViewBuilder};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

type ReadOutcome = Result<Buffer, ApiError>;
type SaveOutcome = Result<(), ApiError>;

pub struct EditSession {
    state: Arc<RwLock<EditState>>,
    transport: Arc<dyn Transport>,
    channel: Arc<dyn CommandChannel>,
    views: ViewBuilder,
    reads: Arc<InFlight<ResourceKey, ReadOutcome>>,
    saves: Arc<InFlight<(ResourceKey, String), SaveOutcome>>,
}

impl EditSession {
    pub fn new(transport: Arc<dyn Transport>, channel: Arc<dyn CommandChannel>) -> Self {
        Self {
            state: Arc::new(RwLock::new(EditState::new())),
            transport,
            channel,
            views: ViewBuilder::new(),
            reads: Arc::new(InFlight::new()),
            saves: Arc::new(InFlight::new()),
        }
    }

    /// Run `f` against the current state
    pub fn with_state<R>(&self, f: impl FnOnce(&EditState) -> R) -> R {
        f(&self.state.read())
    }

    pub fn buffer(&self, key: &str) -> Option<Buffer> {
        self.state.read().buffers.get(key).cloned()
    }

    pub fn active_key(&self) -> Option<ResourceKey> {
        self.state.read().explorer.active().map(str::to_string)
    }

    /// Annotated forest for rendering; the same `Arc` until something changes
    pub fn view(&self) -> Arc<AnnotatedForest> {
        self.views.annotated_forest(&self.state.read())
    }

    pub fn active_node(&self) -> Option<Arc<ResourceNode>> {
        self.views.active_node(&self.state.read())
    }

    // --- listing ---

    /// Fetch a category listing and replace that forest
    pub async fn list(&self, category: Category) -> Result<(), ApiError> {
        let nodes = self.transport.list_root(category).await.map_err(|e| {
            let err = ApiError::from(e);
            warn!(category = %category, error = %err, "Listing failed");
            err
        })?;
        let count = nodes.len();
        self.state.write().tree.load(category, nodes)?;
        info!(category = %category, roots = count, "Listed category");
        Ok(())
    }

    /// List every category in turn, stopping at the first failure
    pub async fn list_all(&self) -> Result<(), ApiError> {
        for category in Category::ALL {
            self.list(category).await?;
        }
        Ok(())
    }

    /// Refresh the children of one directory node
    pub async fn directory_read(&self, key: &str) -> Result<(), ApiError> {
        if !self.state.read().tree.contains(key) {
            return Err(ApiError::NotFound(key.to_string()));
        }
        let children = self.transport.list_directory(key).await?;
        self.state.write().tree.replace_children(key, children)?;
        debug!(key = %key, "Directory refreshed");
        Ok(())
    }

    // --- buffers ---

    /// Cached buffer, or a fetch shared with any other pending read of `key`
    pub async fn buffer_read(&self, key: &str) -> Result<Buffer, ApiError> {
        if let Some(buffer) = self.buffer(key) {
            debug!(key = %key, "Buffer cache hit");
            return Ok(buffer);
        }

        let joined = self.reads.join_or_start(key.to_string(), || {
            let transport = Arc::clone(&self.transport);
            let state = Arc::clone(&self.state);
            let key = key.to_string();
            let lease = BufferLease::take(&state);
            async move {
                let cached = state.read().buffers.get(&key).cloned();
                if let Some(buffer) = cached {
                    return Ok(buffer);
                }
                let content = match transport.read_resource(&key).await {
                    Ok(content) => content,
                    Err(e) => {
                        let err = ApiError::from(e);
                        warn!(key = %key, error = %err, "Read failed");
                        return Err(err);
                    }
                };
                let mut guard = state.write();
                let current = match lease.settle(&mut guard.buffers, &key) {
                    Some(current) => current,
                    None => {
                        drop(guard);
                        debug!(key = %key, "Read outlived its resource");
                        return Err(ApiError::NotFound(key));
                    }
                };
                let buffer = guard.buffers.install_loaded(&current, content);
                drop(guard);
                info!(key = %current, bytes = buffer.content.len(), "Buffer loaded");
                Ok(buffer)
            }
        });
        if !joined.started {
            debug!(key = %key, "Joined pending read");
        }
        joined.future.await
    }

    /// Record a local edit
    pub fn buffer_change(&self, key: &str, value: impl Into<String>) {
        self.state.write().buffers.change(key, value.into());
    }

    /// Write `content` to the host.
    ///
    /// On success the buffer holds `content` and is clean; on failure it stays
    /// modified. A pending save of the same key and content is joined rather
    /// than repeated; saves with different content run side by side and the
    /// one that completes last determines the buffer.
    ///
    /// A save whose resource is renamed or deleted before the host answers
    /// reports `NotFound`; a renamed buffer stays modified under its new key.
    pub async fn save(&self, key: &str, content: String) -> Result<(), ApiError> {
        let joined = self
            .saves
            .join_or_start((key.to_string(), content.clone()), || {
                let transport = Arc::clone(&self.transport);
                let state = Arc::clone(&self.state);
                let key = key.to_string();
                let lease = BufferLease::take(&state);
                async move {
                    let written = transport.write_resource(&key, &content).await;
                    let mut guard = state.write();
                    match lease.settle(&mut guard.buffers, &key) {
                        None => {
                            drop(guard);
                            warn!(key = %key, "Save outlived its resource");
                            return Err(ApiError::NotFound(key));
                        }
                        Some(current) if current != key => {
                            // the write went to the old key; the moved buffer is still unsaved
                            guard.buffers.mark_save_failed(&current, content);
                            drop(guard);
                            warn!(key = %key, moved_to = %current, "Save raced a rename");
                            return Err(ApiError::NotFound(key));
                        }
                        Some(_) => {}
                    }
                    match written {
                        Ok(()) => {
                            let bytes = content.len();
                            guard.buffers.mark_saved(&key, content);
                            drop(guard);
                            info!(key = %key, bytes, "Buffer saved");
                            Ok(())
                        }
                        Err(e) => {
                            guard.buffers.mark_save_failed(&key, content);
                            drop(guard);
                            let err = ApiError::from(e);
                            warn!(key = %key, error = %err, "Save failed");
                            Err(err)
                        }
                    }
                }
            });
        if !joined.started {
            debug!(key = %key, "Joined pending save");
        }
        joined.future.await
    }

    /// [`save`](Self::save), reporting the outcome to `on_complete` exactly once
    pub async fn buffer_save<F>(&self, key: &str, content: String, on_complete: F)
    where
        F: FnOnce(Result<(), ApiError>) + Send,
    {
        let outcome = self.save(key, content).await;
        on_complete(outcome);
    }

    pub fn buffer_select(&self, key: &str) {
        self.state.write().explorer.set_active(key);
    }

    // --- explorer ---

    pub fn toggle_node(&self, key: &str, expanded: bool) {
        self.state.write().explorer.toggle(key, expanded);
    }

    pub fn set_active_node(&self, key: &str) {
        self.state.write().explorer.set_active(key);
    }

    // --- resources ---

    /// Create a script next to `sibling` and insert it into the tree
    pub async fn script_new(&self, sibling: &str, value: &str) -> Result<ResourceNode, ApiError> {
        self.require_node(sibling)?;
        let node = self.transport.create_resource(sibling, value).await?;
        self.place(sibling, &node).await?;
        info!(key = %node.key, sibling = %sibling, "Script created");
        Ok(node)
    }

    /// Insert a client-only script next to `sibling`, holding `value` as an
    /// unsaved buffer. It reaches the host on its first save; until then
    /// renames of it should pass `virtual_node = true`.
    pub fn script_draft(&self, sibling: &str, value: &str) -> Result<ResourceNode, ApiError> {
        let mut state = self.state.write();
        if !state.tree.contains(sibling) {
            return Err(ApiError::NotFound(sibling.to_string()));
        }
        let dir = key::parent(sibling)
            .ok_or_else(|| ApiError::InvalidName(format!("'{}' has no parent", sibling)))?;
        let name = key::unique_name(key::NEW_SCRIPT_NAME, |candidate| {
            let k = key::join(dir, candidate);
            state.tree.contains(&k) || state.buffers.contains(&k)
        });
        let node = ResourceNode::leaf(key::join(dir, &name), name);
        state.tree.insert(sibling, node.clone())?;
        state.buffers.change(&node.key, value.to_string());
        debug!(key = %node.key, "Draft script inserted");
        Ok(node)
    }

    /// Copy `source` on the host and insert the copy right after it
    pub async fn script_duplicate(&self, source: &str) -> Result<ResourceNode, ApiError> {
        self.require_node(source)?;
        let node = self.transport.duplicate_resource(source).await?;
        self.place(source, &node).await?;
        info!(key = %node.key, source = %source, "Script duplicated");
        Ok(node)
    }

    /// Delete a resource on the host, then drop it from the tree and cache.
    ///
    /// The active key is left pointing at the deleted resource. If the host
    /// no longer has the resource, local state is still purged and `NotFound`
    /// is reported.
    pub async fn resource_delete(&self, key: &str) -> Result<(), ApiError> {
        let remote = self.transport.delete_resource(key).await.map_err(ApiError::from);
        if let Err(ApiError::RemoteFailure(_)) = &remote {
            warn!(key = %key, "Delete refused by host");
            return remote;
        }

        let removed = {
            let mut state = self.state.write();
            let evicted = state.buffers.evict(key);
            let removed = state.tree.remove(key);
            debug!(key = %key, evicted, "Purged deleted resource");
            removed
        };
        remote?;
        removed?;
        info!(key = %key, "Resource deleted");
        Ok(())
    }

    /// Rename `node` to `new_name` within its directory.
    ///
    /// `virtual_node` marks an item that exists only on the client; it is
    /// renamed locally without contacting the host. Tree, buffers, and
    /// explorer keys all move together.
    pub async fn resource_rename(
        &self,
        node: &ResourceNode,
        new_name: &str,
        virtual_node: bool,
    ) -> Result<ResourceNode, ApiError> {
        key::validate_name(new_name)?;
        let old_key = node.key.clone();
        let dir = key::parent(&old_key)
            .ok_or_else(|| ApiError::InvalidName(format!("'{}' has no parent", old_key)))?;
        let predicted = key::join(dir, new_name);
        if predicted != old_key && self.state.read().tree.contains(&predicted) {
            return Err(ApiError::Conflict(format!("'{}' already exists", predicted)));
        }

        let (new_key, new_label) = if virtual_node {
            (predicted, new_name.to_string())
        } else {
            let renamed = self.transport.rename_resource(&old_key, new_name).await?;
            (renamed.key, renamed.label)
        };

        let tree_result = {
            let mut state = self.state.write();
            let tree_result = if virtual_node {
                // nothing has changed on the host, so a conflict can still back out
                match state.tree.rename(&old_key, &new_key, &new_label) {
                    Err(err @ ApiError::Conflict(_)) => return Err(err),
                    other => other,
                }
            } else {
                if new_key != old_key {
                    make_room(&mut state, &new_key, &old_key);
                }
                state.tree.rename(&old_key, &new_key, &new_label)
            };
            // a node missing from the tree still has its buffers and selection moved
            let migrated = state.buffers.migrate(&old_key, &new_key);
            state.explorer.rekey(&old_key, &new_key);
            info!(
                old = %old_key,
                new = %new_key,
                migrated,
                virtual_node,
                "Resource renamed"
            );
            tree_result
        };
        match tree_result {
            Ok(()) => {}
            Err(ApiError::Conflict(reason)) => {
                // the host has already moved it; take the host's word for the directory
                warn!(
                    old = %old_key,
                    new = %new_key,
                    reason = %reason,
                    "Renamed tree out of step, relisting"
                );
                self.refresh_parent(&new_key).await?;
            }
            Err(err) => return Err(err),
        }
        Ok(self
            .state
            .read()
            .tree
            .find(&new_key)
            .cloned()
            .unwrap_or_else(|| ResourceNode::leaf(new_key, new_label)))
    }

    // --- remote commands ---

    /// Ask the script runtime to load and run the script at `key`
    pub fn script_run(&self, key: &str) -> Result<(), ApiError> {
        let path = self.transport.path_for_resource(key);
        info!(key = %key, path = %path, "Running script");
        self.channel.send(MATRON_COMPONENT, &script_load_command(&path))
    }

    /// Forward raw command text to a named component
    pub fn command_send(&self, target: &str, text: &str) -> Result<(), ApiError> {
        self.channel.send(target, text)
    }

    /// Insert a node the host just created right after `anchor`, relisting
    /// its directory if the local tree cannot take it.
    async fn place(&self, anchor: &str, node: &ResourceNode) -> Result<(), ApiError> {
        let inserted = {
            let mut state = self.state.write();
            let anchor = make_room(&mut state, &node.key, anchor);
            state.tree.insert(&anchor, node.clone())
        };
        if let Err(err) = inserted {
            warn!(key = %node.key, error = %err, "Created resource out of step, relisting");
            self.refresh_parent(&node.key).await?;
        }
        Ok(())
    }

    /// Reload the listing that holds `key`
    async fn refresh_parent(&self, key: &str) -> Result<(), ApiError> {
        let parent = key::parent(key)
            .ok_or_else(|| ApiError::InvalidName(format!("'{}' has no parent", key)))?;
        match transport::split_key(parent) {
            Some((category, "")) => self.list(category).await,
            _ => self.directory_read(parent).await,
        }
    }

    fn require_node(&self, key: &str) -> Result<(), ApiError> {
        if self.state.read().tree.contains(key) {
            Ok(())
        } else {
            Err(ApiError::NotFound(key.to_string()))
        }
    }
}

/// Move whatever the client holds at `claimed` to a free sibling name.
///
/// The host has just handed out `claimed`, so anything local there is a
/// client-only leftover. Returns `follow` rebased if it was moved along.
fn make_room(state: &mut EditState, claimed: &str, follow: &str) -> ResourceKey {
    if !state.tree.contains(claimed) && !state.buffers.contains(claimed) {
        return follow.to_string();
    }
    let dir = match key::parent(claimed) {
        Some(dir) => dir,
        None => return follow.to_string(),
    };
    let name = key::unique_name(key::file_name(claimed), |candidate| {
        let k = key::join(dir, candidate);
        state.tree.contains(&k) || state.buffers.contains(&k)
    });
    let moved = key::join(dir, &name);
    if state.tree.contains(claimed) {
        if let Err(err) = state.tree.rename(claimed, &moved, &name) {
            warn!(key = %claimed, error = %err, "Could not move local node aside");
            return follow.to_string();
        }
    }
    state.buffers.migrate(claimed, &moved);
    state.explorer.rekey(claimed, &moved);
    warn!(key = %claimed, moved_to = %moved, "Local node yielded its key to the host");
    key::rebase(follow, claimed, &moved).unwrap_or_else(|| follow.to_string())
}

/// A relocation lease on the buffer cache held by one remote request.
///
/// Released on drop if the request never settles.
struct BufferLease {
    state: Arc<RwLock<EditState>>,
    mark: u64,
    settled: bool,
}

impl BufferLease {
    fn take(state: &Arc<RwLock<EditState>>) -> Self {
        let mark = state.write().buffers.lease();
        Self {
            state: Arc::clone(state),
            mark,
            settled: false,
        }
    }

    /// Where `key` lives now; `None` if it was deleted
    fn settle(mut self, buffers: &mut BufferCache, key: &str) -> Option<ResourceKey> {
        self.settled = true;
        buffers.settle(key, self.mark)
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        if !self.settled {
            self.state.write().buffers.release(self.mark);
        }
    }
}
