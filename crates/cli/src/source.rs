//! Install sources: a local path, or a git repository cloned on demand.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

/// A resolved install source. A cloned checkout lives as long as this value.
#[derive(Debug)]
pub(crate) struct Source {
    path: PathBuf,
    _checkout: Option<TempDir>,
}

impl Source {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// True when `raw` names a git remote rather than a local path.
pub(crate) fn is_git_url(raw: &str) -> bool {
    let url = raw.split('#').next().unwrap_or(raw);
    ["https://", "http://", "ssh://", "git://", "git@"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
        || (url.ends_with(".git") && !Path::new(url).exists())
}

/// Resolves `raw` to a path on disk.
///
/// Git sources are shallow-cloned into a temporary directory; a `#<subdir>`
/// suffix selects a path inside the checkout.
pub(crate) fn resolve(raw: &str) -> Result<Source> {
    if !is_git_url(raw) {
        return Ok(Source {
            path: PathBuf::from(raw),
            _checkout: None,
        });
    }

    let (url, subdir) = match raw.split_once('#') {
        Some((url, sub)) => (url, Some(sub)),
        None => (raw, None),
    };
    if let Some(sub) = subdir {
        if Path::new(sub)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            bail!("invalid subdirectory '{sub}' in git source (must be a relative path without '..')");
        }
    }

    let checkout = tempfile::Builder::new()
        .prefix("aix-source-")
        .tempdir()
        .context("creating temp dir for git checkout")?;
    debug!(url, dir = %checkout.path().display(), "Cloning git source");

    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--quiet", "--", url])
        .arg(checkout.path())
        .output()
        .context("running git (is it installed?)")?;
    if !output.status.success() {
        bail!(
            "git clone {url} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let path = match subdir {
        Some(sub) => checkout.path().join(sub),
        None => checkout.path().to_path_buf(),
    };
    Ok(Source {
        path,
        _checkout: Some(checkout),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_git_remotes() {
        assert!(is_git_url("https://github.com/acme/skills"));
        assert!(is_git_url("git@github.com:acme/skills.git"));
        assert!(is_git_url("ssh://git@host/repo#skills/reviewer"));
        assert!(is_git_url("acme/skills.git"));
        assert!(!is_git_url("./skills/reviewer"));
        assert!(!is_git_url("/tmp/reviewer.md"));
    }

    #[test]
    fn existing_dot_git_path_is_local() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("tools.git");
        std::fs::create_dir(&dir).unwrap();
        assert!(!is_git_url(dir.to_str().unwrap()));
    }

    #[test]
    fn local_paths_pass_through() {
        let source = resolve("some/dir").unwrap();
        assert_eq!(source.path(), Path::new("some/dir"));
    }

    #[test]
    fn subdir_cannot_escape_checkout() {
        let err = resolve("https://example.invalid/repo.git#../etc").unwrap_err();
        assert!(err.to_string().contains("invalid subdirectory"));
    }
}
