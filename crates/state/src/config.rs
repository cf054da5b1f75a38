//! The tool's own configuration file, `<config-home>/aix/config.yaml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

use crate::atomic::{atomic_write_yaml, DEFAULT_FILE_MODE};
use crate::error::AixError;
use crate::paths::Paths;
use crate::platform::Platform;

/// Current schema version of `config.yaml`.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Platforms targeted when a command is given no `--platform`.
    #[serde(default)]
    pub default_platforms: Vec<Platform>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            default_platforms: Vec::new(),
        }
    }
}

/// Loads `config.yaml`; a missing file yields the defaults.
pub fn load_config(paths: &Paths) -> Result<ToolConfig, AixError> {
    let path = paths.tool_config_path();
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(target: "aix::config", path = %path.display(), "No config file, using defaults");
            return Ok(ToolConfig::default());
        }
        Err(e) => return Err(AixError::io("reading", &path, e)),
    };
    if text.trim().is_empty() {
        return Ok(ToolConfig::default());
    }
    serde_yaml::from_str(&text).map_err(|e| AixError::parse(&path, e.to_string()))
}

/// Saves `config.yaml` atomically.
pub fn save_config(paths: &Paths, config: &ToolConfig) -> Result<(), AixError> {
    atomic_write_yaml(&paths.tool_config_path(), config, DEFAULT_FILE_MODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        assert_eq!(load_config(&paths).unwrap(), ToolConfig::default());
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let cfg = ToolConfig {
            version: CONFIG_VERSION,
            default_platforms: vec![Platform::Claude, Platform::OpenCode],
        };
        save_config(&paths, &cfg).unwrap();
        assert_eq!(load_config(&paths).unwrap(), cfg);
    }

    #[test]
    fn unknown_platform_is_a_parse_error_naming_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let path = paths.tool_config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "version: 1\ndefault_platforms: [claude, cursor]\n").unwrap();

        let err = load_config(&paths).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn version_defaults_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let path = paths.tool_config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "default_platforms: [gemini]\n").unwrap();

        let cfg = load_config(&paths).unwrap();
        assert_eq!(cfg.version, CONFIG_VERSION);
        assert_eq!(cfg.default_platforms, vec![Platform::Gemini]);
    }
}
