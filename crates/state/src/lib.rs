//! Shared state for aix: where every platform keeps its files, how the tool
//! itself is configured, and how config files are written safely.
//!
//! This crate provides:
//! - The closed set of supported platforms and artifact kinds.
//! - Path resolution from the environment (home directory, XDG base).
//! - The tool configuration file (`config.yaml`).
//! - Crash-safe atomic writes for raw bytes, JSON, YAML, and TOML.
//! - The error taxonomy shared by every other crate.

#![deny(unsafe_code)]

pub mod atomic;
pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod platform;

pub use atomic::{
    atomic_write, atomic_write_json, atomic_write_toml, atomic_write_yaml, existing_mode_or,
    file_mode, set_file_mode, DEFAULT_FILE_MODE, PRIVATE_FILE_MODE,
};
pub use config::{load_config, save_config, ToolConfig, CONFIG_VERSION};
pub use env::{
    config_home, env_backup_retention, env_debug, expand_tilde, home_dir, DEFAULT_BACKUP_RETENTION,
};
pub use error::{classify, AixError, ErrorKind, ErrorReport};
pub use paths::Paths;
pub use platform::{is_valid_platform, ArtifactKind, Platform};

/// Application name used for the tool directory and temp-file prefixes.
pub const APP_NAME: &str = "aix";

/// Tool version recorded in backup manifests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
