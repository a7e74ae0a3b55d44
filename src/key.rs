//! Path-like resource key helpers.
//!
//! Keys are `/`-separated strings. A child conventionally carries its
//! parent's key as a prefix, which is what lets renames and evictions reach
//! descendants.

use crate::error::ApiError;

/// Parent portion of a key, or `None` for a key without a separator
pub fn parent(key: &str) -> Option<&str> {
    let trimmed = key.trim_end_matches('/');
    trimmed.rfind('/').map(|idx| &trimmed[..idx])
}

/// Final path segment of a key
pub fn file_name(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

pub fn join(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

/// True when `key` lies strictly below `ancestor`
pub fn is_descendant(key: &str, ancestor: &str) -> bool {
    key.len() > ancestor.len() + 1
        && key.starts_with(ancestor)
        && key.as_bytes()[ancestor.len()] == b'/'
}

/// Rewrite `key` from the `old` prefix to the `new` prefix.
///
/// Returns `None` when `key` is neither `old` nor one of its descendants.
pub fn rebase(key: &str, old: &str, new: &str) -> Option<String> {
    if key == old {
        Some(new.to_string())
    } else if is_descendant(key, old) {
        Some(format!("{}{}", new, &key[old.len()..]))
    } else {
        None
    }
}

/// Validate a single path segment supplied by a user
pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.trim().is_empty() {
        return Err(ApiError::InvalidName("name is empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ApiError::InvalidName(format!(
            "'{}' contains a path separator",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(ApiError::InvalidName(format!("'{}' is reserved", name)));
    }
    Ok(())
}

/// Split `name` into stem and extension (extension includes no dot)
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

/// Pick a name that `taken` does not report as used.
///
/// Tries `desired` first, then `<stem>-1.<ext>`, `<stem>-2.<ext>`, ...
pub fn unique_name<F>(desired: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !taken(desired) {
        return desired.to_string();
    }
    let (stem, ext) = split_extension(desired);
    let mut n = 1usize;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}-{}.{}", stem, n, ext),
            None => format!("{}-{}", stem, n),
        };
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Name used for a copy of `name` (`foo.lua` -> `foo-copy.lua`)
pub fn copy_name(name: &str) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{}-copy.{}", stem, ext),
        (stem, None) => format!("{}-copy", stem),
    }
}

/// Name given to freshly created scripts
pub const NEW_SCRIPT_NAME: &str = "untitled.lua";
