//! Canonical MCP server model and the summary records adapters list.

use aix_state::{AixError, Platform};
use aix_validate::name_problem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How a client reaches an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    /// Spawned subprocess speaking over stdin/stdout.
    Stdio,
    /// Remote endpoint (SSE or streamable HTTP).
    Sse,
}

impl McpTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpTransport::Stdio => "stdio",
            McpTransport::Sse => "sse",
        }
    }

    /// Canonicalizes a native `type` value. `http`, `remote` and
    /// `streamable-http` are all remote servers.
    pub fn from_native(value: &str) -> Option<Self> {
        match value {
            "stdio" | "local" => Some(McpTransport::Stdio),
            "sse" | "http" | "remote" | "streamable-http" => Some(McpTransport::Sse),
            _ => None,
        }
    }
}

impl fmt::Display for McpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform-agnostic MCP server definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<McpTransport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// OS restriction (`darwin`, `linux`, `win32`). Only Claude stores it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
}

impl McpServer {
    /// A subprocess server.
    pub fn stdio(name: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            transport: Some(McpTransport::Stdio),
            command: Some(command.into()),
            args,
            ..Default::default()
        }
    }

    /// A remote server.
    pub fn sse(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: Some(McpTransport::Sse),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Returns the transport, inferring it from `command`/`url` when unset.
    pub fn resolved_transport(&self) -> Result<McpTransport, AixError> {
        if let Some(t) = self.transport {
            return Ok(t);
        }
        match (self.command.is_some(), self.url.is_some()) {
            (true, false) => Ok(McpTransport::Stdio),
            (false, true) => Ok(McpTransport::Sse),
            (true, true) => Err(self.invalid("set either a command or a url, not both")),
            (false, false) => Err(self.invalid("a command or a url is required")),
        }
    }

    /// Checks the name grammar and that the transport has what it needs.
    pub fn validate(&self) -> Result<McpTransport, AixError> {
        if let Some(problem) = name_problem(&self.name) {
            return Err(self.invalid(format!("name: {problem}")));
        }
        let transport = self.resolved_transport()?;
        match transport {
            McpTransport::Stdio if self.command.as_deref().is_none_or(str::is_empty) => {
                Err(self.invalid("stdio servers need a command"))
            }
            McpTransport::Sse if self.url.as_deref().is_none_or(str::is_empty) => {
                Err(self.invalid("sse servers need a url"))
            }
            _ => Ok(transport),
        }
    }

    /// The command line or URL, for one-line listings.
    pub fn target(&self) -> String {
        match (&self.command, &self.url) {
            (Some(cmd), _) if !cmd.is_empty() => {
                let mut line = cmd.clone();
                for arg in &self.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                line
            }
            (_, Some(url)) => url.clone(),
            _ => String::new(),
        }
    }

    /// The fields every platform models, used to compare copies of one server.
    pub fn portable_view(&self) -> PortableMcp {
        PortableMcp {
            transport: self.resolved_transport().ok(),
            command: self.command.clone(),
            args: self.args.clone(),
            url: self.url.clone(),
            env: self.env.clone(),
            headers: self.headers.clone(),
            disabled: self.disabled,
        }
    }

    fn invalid(&self, issue: impl Into<String>) -> AixError {
        AixError::Validation {
            subject: format!("mcp server '{}'", self.name),
            issues: vec![issue.into()],
        }
    }
}

/// Projection of [`McpServer`] onto the fields every platform can store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableMcp {
    pub transport: Option<McpTransport>,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub url: Option<String>,
    pub env: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub disabled: bool,
}

/// An installed skill as listed by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillInfo {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub path: PathBuf,
}

/// An installed agent as listed by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub path: PathBuf,
}

/// An installed command as listed by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
}

/// A configured MCP server as listed by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpInfo {
    pub name: String,
    pub transport: McpTransport,
    pub target: String,
    pub disabled: bool,
}

impl McpInfo {
    pub fn from_server(server: &McpServer) -> Self {
        Self {
            name: server.name.clone(),
            transport: server.resolved_transport().unwrap_or(McpTransport::Stdio),
            target: server.target(),
            disabled: server.disabled,
        }
    }
}

/// Something an adapter found on one platform, tagged with where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Located<T> {
    pub platform: Platform,
    #[serde(flatten)]
    pub item: T,
}
