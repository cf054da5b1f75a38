//! Detects MCP servers whose definitions differ between platforms.
//!
//! Only fields every platform can store are compared. Nothing is ever merged;
//! the caller decides which copy is right.

use aix_backup::classify;
use aix_state::{AixError, ErrorKind, Platform};
use serde::Serialize;

use crate::adapters::PlatformAdapter;
use crate::common::PortableMcp;
use crate::Result;

/// How one MCP server differs across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub name: String,
    /// Platforms that define the server
    pub present: Vec<Platform>,
    /// Platforms that do not
    pub missing: Vec<Platform>,
    /// Present platforms grouped by identical definitions
    pub groups: Vec<Vec<Platform>>,
    /// Portable fields whose values are not the same everywhere
    pub differing_fields: Vec<&'static str>,
}

impl Divergence {
    /// True when every platform that has the server agrees on it.
    pub fn is_consistent(&self) -> bool {
        self.groups.len() <= 1
    }
}

/// Compares the MCP server `name` across `adapters`.
pub fn mcp_divergence(name: &str, adapters: &[Box<dyn PlatformAdapter>]) -> Result<Divergence> {
    let mut views: Vec<(Platform, PortableMcp)> = Vec::new();
    let mut missing = Vec::new();

    for adapter in adapters {
        let platform = adapter.platform();
        match adapter.get_mcp(name) {
            Ok(server) => views.push((platform, server.portable_view())),
            Err(e) if classify(&e) == ErrorKind::NotFound => missing.push(platform),
            Err(e) => return Err(e.context(format!("reading mcp server '{name}' on {platform}"))),
        }
    }

    if views.is_empty() {
        let searched: Vec<&str> = missing.iter().map(|p| p.as_str()).collect();
        return Err(AixError::not_found(
            format!("mcp server '{name}'"),
            format!("any platform ({})", searched.join(", ")),
        )
        .into());
    }

    let mut groups: Vec<(&PortableMcp, Vec<Platform>)> = Vec::new();
    for (platform, view) in &views {
        match groups.iter_mut().find(|(v, _)| *v == view) {
            Some((_, members)) => members.push(*platform),
            None => groups.push((view, vec![*platform])),
        }
    }

    let first = &views[0].1;
    let differing_fields = FIELDS
        .into_iter()
        .filter(|field| views.iter().any(|(_, v)| !same_field(field, first, v)))
        .collect();

    Ok(Divergence {
        name: name.to_string(),
        present: views.iter().map(|(p, _)| *p).collect(),
        missing,
        groups: groups.into_iter().map(|(_, members)| members).collect(),
        differing_fields,
    })
}

const FIELDS: [&str; 7] = [
    "transport",
    "command",
    "args",
    "url",
    "env",
    "headers",
    "disabled",
];

fn same_field(field: &str, a: &PortableMcp, b: &PortableMcp) -> bool {
    match field {
        "transport" => a.transport == b.transport,
        "command" => a.command == b.command,
        "args" => a.args == b.args,
        "url" => a.url == b.url,
        "env" => a.env == b.env,
        "headers" => a.headers == b.headers,
        "disabled" => a.disabled == b.disabled,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ClaudeAdapter, GeminiAdapter, OpenCodeAdapter};
    use crate::common::McpServer;
    use aix_backup::BackupManager;
    use aix_state::Paths;

    fn adapters(paths: &Paths) -> Vec<Box<dyn PlatformAdapter>> {
        let backups = BackupManager::new(paths);
        vec![
            Box::new(ClaudeAdapter::with_backups(paths, backups.clone())),
            Box::new(OpenCodeAdapter::with_backups(paths, backups.clone())),
            Box::new(GeminiAdapter::with_backups(paths, backups)),
        ]
    }

    #[test]
    fn identical_servers_are_consistent() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let all = adapters(&paths);
        let server = McpServer::stdio("github", "npx", vec!["gh-mcp".into()]);
        for a in &all[..2] {
            a.add_mcp(&server).unwrap();
        }

        let d = mcp_divergence("github", &all).unwrap();
        assert!(d.is_consistent());
        assert_eq!(d.present, vec![Platform::Claude, Platform::OpenCode]);
        assert_eq!(d.missing, vec![Platform::Gemini]);
        assert!(d.differing_fields.is_empty());
    }

    #[test]
    fn differing_fields_are_named() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let all = adapters(&paths);
        let server = McpServer::stdio("github", "npx", vec!["gh-mcp".into()]);
        all[0].add_mcp(&server).unwrap();
        all[1].add_mcp(&server).unwrap();
        let mut other = server.clone();
        other.args.push("--verbose".into());
        all[2].add_mcp(&other).unwrap();
        all[1].disable_mcp("github").unwrap();

        let d = mcp_divergence("github", &all).unwrap();
        assert!(!d.is_consistent());
        assert_eq!(d.groups.len(), 3);
        assert_eq!(d.differing_fields, vec!["args", "disabled"]);
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let err = mcp_divergence("ghost", &adapters(&paths)).unwrap_err();
        assert_eq!(classify(&err), ErrorKind::NotFound);
        assert!(err.to_string().contains("claude, opencode, gemini"));
    }
}
