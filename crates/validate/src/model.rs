//! Canonical, platform-agnostic artifact types and their source loaders.

use aix_state::AixError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::frontmatter;

/// File name of a skill's definition inside its directory.
pub const SKILL_FILE: &str = "SKILL.md";
/// File name of a directory-style command's definition.
pub const COMMAND_FILE: &str = "command.md";
/// Optional sibling directories copied along with a skill.
pub const SKILL_SUBDIRS: [&str; 4] = ["docs", "tests", "bin", "data"];

/// Treats an empty YAML value (`description:`) as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts either a YAML list or a comma-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        One(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::List(v)) => v,
        Some(Raw::One(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
    })
}

/// Platforms a skill declares support for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Compatibility {
    /// `[claude, opencode]`
    List(Vec<String>),
    /// `{claude: ">=1.0"}`
    Map(BTreeMap<String, String>),
}

impl Compatibility {
    /// Platform identifiers named by this declaration.
    pub fn platforms(&self) -> Vec<&str> {
        match self {
            Compatibility::List(v) => v.iter().map(String::as_str).collect(),
            Compatibility::Map(m) => m.keys().map(String::as_str).collect(),
        }
    }
}

/// Frontmatter of `SKILL.md`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SkillMeta {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<Compatibility>,
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_tools: Vec<String>,
    /// Open map; `version` and `author` are conventional keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_yaml::Value>,
}

impl SkillMeta {
    /// Returns a metadata entry rendered as a string.
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<String> {
        self.metadata_str("version")
    }
}

/// Frontmatter of an agent file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMeta {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// OpenCode: `primary`, `subagent`, or `all`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// OpenCode sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Claude tool allow-list.
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tools: Vec<String>,
    /// Claude UI color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Frontmatter of a slash command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandMeta {
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub allowed_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<serde_yaml::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A skill: a directory holding `SKILL.md` and optional resource folders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skill {
    pub meta: SkillMeta,
    pub body: String,
    /// Directory the skill was loaded from, if it came from disk.
    pub source_dir: Option<PathBuf>,
}

impl Skill {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Renders `SKILL.md`.
    pub fn to_markdown(&self) -> Result<String, AixError> {
        frontmatter::format(&self.meta, &self.body)
    }
}

/// An agent: a single Markdown file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agent {
    pub meta: AgentMeta,
    pub body: String,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.meta.name
    }
}

/// A slash command: the prompt body plus metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub meta: CommandMeta,
    pub body: String,
    /// Directory the command was loaded from, when it came from `<dir>/command.md`.
    pub source_dir: Option<PathBuf>,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.meta.name
    }
}

fn read_source(path: &Path) -> Result<String, AixError> {
    fs::read_to_string(path).map_err(|e| {
        let message = match e.kind() {
            io::ErrorKind::NotFound => "file does not exist".to_string(),
            io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => e.to_string(),
        };
        AixError::parse(path, message)
    })
}

fn parse_source<T>(path: &Path, content: &str) -> Result<(T, String), AixError>
where
    T: serde::de::DeserializeOwned + Default,
{
    frontmatter::parse(content).map_err(|e| AixError::parse(path, e.to_string()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Loads a skill from its directory or from a `SKILL.md` path.
pub fn load_skill(path: &Path) -> Result<Skill, AixError> {
    let (dir, file) = if path.is_dir() {
        (path.to_path_buf(), path.join(SKILL_FILE))
    } else {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (dir, path.to_path_buf())
    };
    let content = read_source(&file)?;
    let (meta, body) = parse_source::<SkillMeta>(&file, &content)?;
    Ok(Skill {
        meta,
        body,
        source_dir: Some(dir),
    })
}

/// Loads an agent from `<name>.md`.
///
/// Agents without a `name` field take the file stem.
pub fn load_agent(path: &Path) -> Result<Agent, AixError> {
    let content = read_source(path)?;
    let (mut meta, body) = parse_source::<AgentMeta>(path, &content)?;
    if meta.name.is_empty() {
        meta.name = file_stem(path);
    }
    Ok(Agent { meta, body })
}

/// Loads a command from a directory holding `command.md` or from a
/// standalone `.md` file.
///
/// Commands without a `name` field take the directory or file stem.
pub fn load_command(path: &Path) -> Result<Command, AixError> {
    let (file, fallback_name, source_dir) = if path.is_dir() {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        (path.join(COMMAND_FILE), name, Some(path.to_path_buf()))
    } else {
        (path.to_path_buf(), file_stem(path), None)
    };
    let content = read_source(&file)?;
    let (mut meta, body) = parse_source::<CommandMeta>(&file, &content)?;
    if meta.name.is_empty() {
        meta.name = fallback_name;
    }
    Ok(Command {
        meta,
        body,
        source_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aix_test_utils::TestFixture;

    #[test]
    fn load_skill_from_dir_and_file() {
        let fx = TestFixture::new().unwrap();
        let dir = fx
            .write_skill_with_frontmatter("reviewer", "Reviews code", "Be careful.")
            .unwrap();

        let from_dir = load_skill(&dir).unwrap();
        assert_eq!(from_dir.name(), "reviewer");
        assert_eq!(from_dir.meta.description, "Reviews code");
        assert_eq!(from_dir.body, "Be careful.");
        assert_eq!(from_dir.source_dir.as_deref(), Some(dir.as_path()));

        let from_file = load_skill(&dir.join(SKILL_FILE)).unwrap();
        assert_eq!(from_file, from_dir);
    }

    #[test]
    fn allowed_tools_accepts_string_or_list() {
        let (meta, _): (SkillMeta, String) =
            frontmatter::parse("---\nname: a\nallowed-tools: Read, Grep\n---\n").unwrap();
        assert_eq!(meta.allowed_tools, vec!["Read", "Grep"]);

        let (meta, _): (SkillMeta, String) =
            frontmatter::parse("---\nname: a\nallowed-tools: [Read, \"Bash(git:*)\"]\n---\n").unwrap();
        assert_eq!(meta.allowed_tools, vec!["Read", "Bash(git:*)"]);
    }

    #[test]
    fn compatibility_list_or_map() {
        let (meta, _): (SkillMeta, String) =
            frontmatter::parse("---\nname: a\ncompatibility: [claude, codex]\n---\n").unwrap();
        assert_eq!(
            meta.compatibility.unwrap().platforms(),
            vec!["claude", "codex"]
        );

        let (meta, _): (SkillMeta, String) =
            frontmatter::parse("---\nname: a\ncompatibility:\n  opencode: \">=0.5\"\n---\n")
                .unwrap();
        assert_eq!(meta.compatibility.unwrap().platforms(), vec!["opencode"]);
    }

    #[test]
    fn metadata_version_renders_numbers() {
        let (meta, _): (SkillMeta, String) =
            frontmatter::parse("---\nname: a\nmetadata:\n  version: 1.2\n  author: me\n---\n")
                .unwrap();
        assert_eq!(meta.version().as_deref(), Some("1.2"));
        assert_eq!(meta.metadata_str("author").as_deref(), Some("me"));
    }

    #[test]
    fn missing_skill_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_skill(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), aix_state::ErrorKind::Parse);
        assert!(err.to_string().contains("SKILL.md"));
        assert!(err.to_string().contains("file does not exist"));
    }

    #[test]
    fn bad_yaml_names_the_file() {
        let fx = TestFixture::new().unwrap();
        let dir = fx.write_skill("broken", "---\nname: [x\n---\nbody").unwrap();
        let err = load_skill(&dir).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("parsing "));
        assert!(msg.contains("invalid YAML frontmatter"));
    }

    #[test]
    fn agent_name_falls_back_to_stem() {
        let fx = TestFixture::new().unwrap();
        let path = fx
            .write_markdown("helper", "---\ndescription: Helps\nmode: subagent\n---\nHi")
            .unwrap();
        let agent = load_agent(&path).unwrap();
        assert_eq!(agent.name(), "helper");
        assert_eq!(agent.meta.mode.as_deref(), Some("subagent"));
    }

    #[test]
    fn agent_keeps_unknown_fields() {
        let fx = TestFixture::new().unwrap();
        let path = fx
            .write_markdown(
                "helper",
                "---\nname: helper\ndescription: Helps\npermission:\n  edit: deny\n---\nHi",
            )
            .unwrap();
        let agent = load_agent(&path).unwrap();
        assert!(agent.meta.extra.contains_key("permission"));
    }

    #[test]
    fn command_from_directory_or_file() {
        let fx = TestFixture::new().unwrap();
        let dir = fx.source_dir().join("deploy");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(COMMAND_FILE),
            "---\ndescription: Deploy it\nargument-hint: <env>\n---\nDeploy to $ARGUMENTS",
        )
        .unwrap();
        let cmd = load_command(&dir).unwrap();
        assert_eq!(cmd.name(), "deploy");
        assert_eq!(cmd.source_dir.as_deref(), Some(dir.as_path()));
        assert_eq!(cmd.meta.argument_hint.as_deref(), Some("<env>"));

        let file = fx
            .write_markdown("lint", "---\ndescription: Lint\n---\nRun lint")
            .unwrap();
        let cmd = load_command(&file).unwrap();
        assert_eq!(cmd.name(), "lint");
        assert_eq!(cmd.body, "Run lint");
        assert!(cmd.source_dir.is_none());
    }
}
