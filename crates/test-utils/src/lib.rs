//! Shared test utilities for aix crates.
//!
//! This crate provides the env-var guards and the sandboxed `$HOME` fixture
//! used by tests across the aix workspace.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = aix_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// A temp `$HOME` with every platform's config directory pre-created.
///
/// The tempdir is removed when the fixture drops. Source artifacts written
/// through the `write_*` helpers land under `<home>/src`, outside every
/// platform directory.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    /// `~/.claude`
    pub claude_dir: PathBuf,
    /// `~/.config/opencode`
    pub opencode_dir: PathBuf,
    /// `~/.codex`
    pub codex_dir: PathBuf,
    /// `~/.gemini`
    pub gemini_dir: PathBuf,
}

impl TestFixture {
    /// Creates a fixture where all four platforms are present.
    ///
    /// Does NOT set HOME; callers pass `home_path()` to `Paths::with_home`.
    pub fn new() -> std::io::Result<Self> {
        let fixture = Self::empty()?;
        for dir in [
            &fixture.claude_dir,
            &fixture.opencode_dir,
            &fixture.codex_dir,
            &fixture.gemini_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(fixture)
    }

    /// Creates a fixture where no platform is present.
    pub fn empty() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let home = tempdir.path();
        Ok(Self {
            claude_dir: home.join(".claude"),
            opencode_dir: home.join(".config/opencode"),
            codex_dir: home.join(".codex"),
            gemini_dir: home.join(".gemini"),
            tempdir,
        })
    }

    /// Get the path that should be set as HOME.
    pub fn home_path(&self) -> &Path {
        self.tempdir.path()
    }

    /// Directory for source artifacts.
    pub fn source_dir(&self) -> PathBuf {
        self.home_path().join("src")
    }

    /// Writes `<src>/<name>/SKILL.md` with `content` and returns the skill dir.
    pub fn write_skill(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let dir = self.source_dir().join(name);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("SKILL.md"), content)?;
        Ok(dir)
    }

    /// Writes a skill with `name` and `description` frontmatter.
    pub fn write_skill_with_frontmatter(
        &self,
        name: &str,
        description: &str,
        body: &str,
    ) -> std::io::Result<PathBuf> {
        let content = format!("---\nname: {name}\ndescription: {description}\n---\n{body}");
        self.write_skill(name, &content)
    }

    /// Writes `<src>/<name>.md` with `content` and returns the file path.
    pub fn write_markdown(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        let dir = self.source_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{name}.md"));
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_env_var_sets_and_restores() {
        let _g = env_guard();
        const KEY: &str = "AIX_TEST_UTILS_TEST_VAR";
        std::env::remove_var(KEY);

        {
            let _guard = set_env_var(KEY, Some("test_value"));
            assert_eq!(std::env::var(KEY).ok(), Some("test_value".to_string()));
        }
        assert!(std::env::var(KEY).is_err());
    }

    #[test]
    fn test_set_env_var_restores_previous_value() {
        let _g = env_guard();
        const KEY: &str = "AIX_TEST_RESTORE_VAR";
        std::env::set_var(KEY, "original");

        {
            let _guard = set_env_var(KEY, None);
            assert!(std::env::var(KEY).is_err());
        }
        assert_eq!(std::env::var(KEY).ok(), Some("original".to_string()));

        std::env::remove_var(KEY);
    }

    #[test]
    fn test_fixture_creates_platform_dirs() {
        let fixture = TestFixture::new().expect("fixture creation");
        assert!(fixture.claude_dir.is_dir());
        assert!(fixture.opencode_dir.is_dir());
        assert!(fixture.codex_dir.is_dir());
        assert!(fixture.gemini_dir.is_dir());
    }

    #[test]
    fn test_empty_fixture_has_no_platforms() {
        let fixture = TestFixture::empty().expect("fixture creation");
        assert!(fixture.home_path().is_dir());
        assert!(!fixture.claude_dir.exists());
    }

    #[test]
    fn test_fixture_write_skill_with_frontmatter() {
        let fixture = TestFixture::new().expect("fixture creation");
        let dir = fixture
            .write_skill_with_frontmatter("fm-skill", "A test skill", "Body content")
            .expect("write skill");

        let content = std::fs::read_to_string(dir.join("SKILL.md")).unwrap();
        assert!(content.starts_with("---\nname: fm-skill\n"));
        assert!(content.ends_with("Body content"));
    }
}
