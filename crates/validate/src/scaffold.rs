//! `init` scaffolding: new artifact skeletons from a name and description.

use aix_state::{atomic_write, AixError, DEFAULT_FILE_MODE};
use std::fs;
use std::path::{Path, PathBuf};

use crate::frontmatter;
use crate::model::{AgentMeta, CommandMeta, SkillMeta, SKILL_FILE};
use crate::name::name_problem;

fn check_name(kind: &str, name: &str) -> Result<(), AixError> {
    match name_problem(name) {
        Some(problem) => Err(AixError::Validation {
            subject: format!("{kind} '{name}'"),
            issues: vec![format!("name: {problem}")],
        }),
        None => Ok(()),
    }
}

fn refuse_existing(kind: &str, name: &str, path: &Path) -> Result<(), AixError> {
    if path.exists() {
        return Err(AixError::conflict(
            format!("{kind} '{name}'"),
            path.parent().unwrap_or(path).display().to_string(),
        ));
    }
    Ok(())
}

/// Creates `<parent>/<name>/SKILL.md` and an empty `docs/` folder.
pub fn init_skill(parent: &Path, name: &str, description: &str) -> Result<PathBuf, AixError> {
    check_name("skill", name)?;
    let dir = parent.join(name);
    refuse_existing("skill", name, &dir)?;

    let meta = SkillMeta {
        name: name.to_string(),
        description: description.to_string(),
        ..Default::default()
    };
    let body = format!(
        "# {name}\n\nDescribe when this skill applies and the steps to follow.\n"
    );
    let text = frontmatter::format(&meta, &body)?;
    atomic_write(&dir.join(SKILL_FILE), text.as_bytes(), DEFAULT_FILE_MODE)?;
    let docs = dir.join("docs");
    fs::create_dir_all(&docs).map_err(|e| AixError::io("creating directory", &docs, e))?;
    Ok(dir)
}

/// Creates `<parent>/<name>.md` for an agent.
pub fn init_agent(parent: &Path, name: &str, description: &str) -> Result<PathBuf, AixError> {
    check_name("agent", name)?;
    let path = parent.join(format!("{name}.md"));
    refuse_existing("agent", name, &path)?;

    let meta = AgentMeta {
        name: name.to_string(),
        description: description.to_string(),
        ..Default::default()
    };
    let body = "You are a focused assistant. Describe the agent's role and constraints here.\n";
    let text = frontmatter::format(&meta, body)?;
    atomic_write(&path, text.as_bytes(), DEFAULT_FILE_MODE)?;
    Ok(path)
}

/// Creates `<parent>/<name>.md` for a slash command.
pub fn init_command(parent: &Path, name: &str, description: &str) -> Result<PathBuf, AixError> {
    check_name("command", name)?;
    let path = parent.join(format!("{name}.md"));
    refuse_existing("command", name, &path)?;

    let meta = CommandMeta {
        description: description.to_string(),
        ..Default::default()
    };
    let text = frontmatter::format(&meta, "Describe the task. Arguments: $ARGUMENTS\n")?;
    atomic_write(&path, text.as_bytes(), DEFAULT_FILE_MODE)?;
    Ok(path)
}
