//! Path-traversal guard, ported from the teacher's `FilesystemStore`
//! (`normalize_path` + `validate_path_within_root`), generalized to a
//! per-vault root.

use std::path::{Path, PathBuf};

use crate::domain::AppError;

/// Resolve `path` (vault-relative) against `root` and reject any result
/// that logically escapes `root`, without touching the filesystem.
pub fn resolve_within_root(root: &Path, path: &str) -> Result<PathBuf, AppError> {
    let full_path = if Path::new(path).is_absolute() { PathBuf::from(path) } else { root.join(path) };

    let normalized_path = normalize_path(&full_path);
    let normalized_root = normalize_path(root);

    if !normalized_path.starts_with(&normalized_root) {
        return Err(AppError::PathTraversal(path.to_string()));
    }

    Ok(full_path)
}

/// Resolve `.` and `..` components logically, without filesystem access.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut ret = if let Some(std::path::Component::RootDir) = components.peek() {
        components.next();
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            std::path::Component::Prefix(..) | std::path::Component::RootDir => ret.push(component.as_os_str()),
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                ret.pop();
            }
            std::path::Component::Normal(c) => ret.push(c),
        }
    }
    ret
}
