//! Shared utility functions for platform adapters.

use aix_state::AixError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

/// Returns true if the name starts with a dot (hidden file/directory).
pub fn is_hidden_component(name: &str) -> bool {
    name.starts_with('.')
}

/// Returns true if any path component is hidden (starts with a dot).
pub fn is_hidden_path(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(s) => is_hidden_component(&s.to_string_lossy()),
        _ => false,
    })
}

/// Computes a SHA-256 hash of the given content, returning a lowercase hex string.
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Returns true if `path` exists and already holds exactly `content`.
pub fn same_content(path: &Path, content: &[u8]) -> bool {
    match fs::read(path) {
        Ok(existing) => hash_content(&existing) == hash_content(content),
        Err(_) => false,
    }
}

/// Copies the regular files under `src` into `dst`, keeping relative paths
/// and permissions. Hidden entries and symlinks are skipped.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize, AixError> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            AixError::io("walking", &path, e.into())
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        if is_hidden_path(rel) {
            continue;
        }
        let target = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| AixError::io("creating directory", &target, e))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).map_err(|e| AixError::io("copying", entry.path(), e))?;
            copied += 1;
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular file");
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hidden_component() {
        assert!(is_hidden_component(".git"));
        assert!(is_hidden_component(".hidden"));
        assert!(!is_hidden_component("visible"));
        assert!(!is_hidden_component(""));
    }

    #[test]
    fn test_is_hidden_path() {
        assert!(is_hidden_path(Path::new(".git/config")));
        assert!(is_hidden_path(Path::new("foo/.hidden/bar")));
        assert!(!is_hidden_path(Path::new("foo/bar/baz")));
        assert!(!is_hidden_path(Path::new("visible.txt")));
    }

    #[test]
    fn test_hash_content() {
        let hash = hash_content(b"hello");
        assert_eq!(hash.len(), 64); // SHA-256 produces 64 hex chars
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_content_compares_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f.md");
        assert!(!same_content(&path, b"x"));
        fs::write(&path, "x").unwrap();
        assert!(same_content(&path, b"x"));
        assert!(!same_content(&path, b"y"));
    }

    #[test]
    fn copy_tree_skips_hidden_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::write(src.join("a.md"), "a").unwrap();
        fs::write(src.join("nested/b.md"), "b").unwrap();
        fs::write(src.join(".git/HEAD"), "ref").unwrap();

        let dst = tmp.path().join("dst");
        assert_eq!(copy_tree(&src, &dst).unwrap(), 2);
        assert_eq!(fs::read_to_string(dst.join("nested/b.md")).unwrap(), "b");
        assert!(!dst.join(".git").exists());
    }
}
