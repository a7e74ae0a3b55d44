//! Local directory host
//!
//! Serves a dust-style directory (`code/`, `data/`, `audio/`) from the local
//! filesystem. Useful against a mounted device share or an offline copy.

use super::{category_dir, contract::Transport, split_key};
use crate::error::TransportError;
use crate::key;
use crate::tree::ResourceNode;
use crate::types::Category;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto the filesystem, refusing anything that would escape the root
    fn resolve(&self, k: &str) -> Result<PathBuf, TransportError> {
        let (category, rel) =
            split_key(k).ok_or_else(|| TransportError::Missing(k.to_string()))?;
        let mut path = self.root.join(category_dir(category));
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(TransportError::Rejected(format!(
                    "'{}' escapes the host root",
                    k
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }

    async fn ensure_exists(&self, k: &str, path: &Path) -> Result<(), TransportError> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TransportError::Missing(k.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_blocking(dir: PathBuf, dir_key: String) -> Result<Vec<ResourceNode>, TransportError> {
        tokio::task::spawn_blocking(move || scan(&dir, &dir_key))
            .await
            .map_err(|e| TransportError::Rejected(format!("listing task failed: {}", e)))?
            .map_err(TransportError::from)
    }

    fn sibling_name(dir: &Path, desired: &str) -> String {
        key::unique_name(desired, |name| dir.join(name).exists())
    }
}

/// List `dir` recursively, sorted by file name, skipping dotfiles
fn scan(dir: &Path, dir_key: &str) -> io::Result<Vec<ResourceNode>> {
    let mut nodes = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let child_key = key::join(dir_key, &name);
        if entry.file_type().is_dir() {
            let children = scan(entry.path(), &child_key)?;
            nodes.push(ResourceNode::directory(child_key, name, children));
        } else {
            nodes.push(ResourceNode::leaf(child_key, name));
        }
    }
    Ok(nodes)
}

#[async_trait]
impl Transport for LocalTransport {
    async fn list_root(&self, category: Category) -> Result<Vec<ResourceNode>, TransportError> {
        let dir = self.root.join(category_dir(category));
        if !dir.is_dir() {
            debug!(path = %dir.display(), "Category directory absent, listing empty");
            return Ok(Vec::new());
        }
        Self::list_blocking(dir, category.root_key()).await
    }

    async fn list_directory(&self, k: &str) -> Result<Vec<ResourceNode>, TransportError> {
        let dir = self.resolve(k)?;
        self.ensure_exists(k, &dir).await?;
        if !dir.is_dir() {
            return Err(TransportError::Rejected(format!("'{}' is not a directory", k)));
        }
        Self::list_blocking(dir, k.to_string()).await
    }

    async fn read_resource(&self, k: &str) -> Result<String, TransportError> {
        let path = self.resolve(k)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TransportError::Missing(k.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_resource(&self, k: &str, content: &str) -> Result<(), TransportError> {
        let path = self.resolve(k)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    async fn create_resource(
        &self,
        sibling: &str,
        value: &str,
    ) -> Result<ResourceNode, TransportError> {
        let sibling_path = self.resolve(sibling)?;
        self.ensure_exists(sibling, &sibling_path).await?;
        let dir_key = key::parent(sibling)
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", sibling)))?;
        let dir = sibling_path
            .parent()
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", sibling)))?;
        let name = Self::sibling_name(dir, key::NEW_SCRIPT_NAME);
        tokio::fs::write(dir.join(&name), value).await?;
        Ok(ResourceNode::leaf(key::join(dir_key, &name), name))
    }

    async fn duplicate_resource(&self, source: &str) -> Result<ResourceNode, TransportError> {
        let source_path = self.resolve(source)?;
        self.ensure_exists(source, &source_path).await?;
        if source_path.is_dir() {
            return Err(TransportError::Rejected(format!(
                "cannot duplicate directory '{}'",
                source
            )));
        }
        let dir_key = key::parent(source)
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", source)))?;
        let dir = source_path
            .parent()
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", source)))?;
        let name = Self::sibling_name(dir, &key::copy_name(key::file_name(source)));
        tokio::fs::copy(&source_path, dir.join(&name)).await?;
        Ok(ResourceNode::leaf(key::join(dir_key, &name), name))
    }

    async fn delete_resource(&self, k: &str) -> Result<(), TransportError> {
        let path = self.resolve(k)?;
        self.ensure_exists(k, &path).await?;
        if path.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn rename_resource(
        &self,
        k: &str,
        new_name: &str,
    ) -> Result<ResourceNode, TransportError> {
        key::validate_name(new_name).map_err(|e| TransportError::Rejected(e.to_string()))?;
        let path = self.resolve(k)?;
        self.ensure_exists(k, &path).await?;
        let dir_key = key::parent(k)
            .ok_or_else(|| TransportError::Rejected(format!("'{}' has no parent", k)))?;
        let target = path.with_file_name(new_name);
        if target != path && target.exists() {
            return Err(TransportError::Rejected(format!(
                "'{}' already exists",
                new_name
            )));
        }
        tokio::fs::rename(&path, &target).await?;
        let new_key = key::join(dir_key, new_name);
        if target.is_dir() {
            let children = Self::list_blocking(target, new_key.clone()).await?;
            Ok(ResourceNode::directory(new_key, new_name, children))
        } else {
            Ok(ResourceNode::leaf(new_key, new_name))
        }
    }

    fn path_for_resource(&self, k: &str) -> String {
        match self.resolve(k) {
            Ok(path) => path.display().to_string(),
            Err(_) => k.to_string(),
        }
    }
}
