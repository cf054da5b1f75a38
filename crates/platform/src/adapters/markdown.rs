//! File-backed artifact storage shared by the adapters.
//!
//! Skills are directories holding `SKILL.md`; agents and commands are single
//! files keyed by their file name.

use aix_state::{atomic_write, existing_mode_or, AixError, ArtifactKind, DEFAULT_FILE_MODE};
use aix_validate::{
    frontmatter, load_agent, load_command, load_skill, Agent, Command, CommandMeta, Skill, SkillMeta,
    SKILL_FILE, SKILL_SUBDIRS,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::utils::{copy_tree, is_hidden_component, same_content};
use super::{check_name, AdapterBase};
use crate::common::{AgentInfo, CommandInfo, SkillInfo};
use crate::report::WriteReport;
use crate::Result;

/// Writes `<skill-dir>/<name>/SKILL.md` from `meta` and the skill body, then
/// copies the resource folders the source directory carries.
pub(crate) fn install_skill(
    base: &AdapterBase,
    skill: &Skill,
    meta: &SkillMeta,
    report: &mut WriteReport,
) -> Result<()> {
    check_name(ArtifactKind::Skill, &meta.name)?;
    let target = base.require_dir(ArtifactKind::Skill)?.join(&meta.name);
    let file = target.join(SKILL_FILE);
    let rendered = frontmatter::format(meta, &skill.body)?;
    let resources = resource_dirs(skill, &target);

    if resources.is_empty() && same_content(&file, rendered.as_bytes()) {
        report.unchanged(&format!("skill '{}'", meta.name));
        return Ok(());
    }

    base.backup()?;
    atomic_write(&file, rendered.as_bytes(), existing_mode_or(&file, DEFAULT_FILE_MODE))?;
    report.written += 1;

    for src in resources {
        let Some(sub) = src.file_name() else { continue };
        let dst = target.join(sub);
        if dst.exists() {
            fs::remove_dir_all(&dst).map_err(|e| AixError::io("removing", &dst, e))?;
        }
        report.written += copy_tree(&src, &dst)?;
    }
    debug!(platform = %base.platform(), skill = %meta.name, files = report.written, "Installed skill");
    Ok(())
}

// Resource folders to copy, none when installing a skill onto itself.
fn resource_dirs(skill: &Skill, target: &Path) -> Vec<PathBuf> {
    let Some(src) = skill.source_dir.as_deref() else {
        return Vec::new();
    };
    let same_dir = match (fs::canonicalize(src), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => src == target,
    };
    if same_dir {
        return Vec::new();
    }
    SKILL_SUBDIRS
        .iter()
        .map(|sub| src.join(sub))
        .filter(|p| p.is_dir())
        .collect()
}

fn skill_path(base: &AdapterBase, name: &str) -> Result<PathBuf> {
    check_name(ArtifactKind::Skill, name)?;
    Ok(base.require_dir(ArtifactKind::Skill)?.join(name))
}

pub(crate) fn exists_skill(base: &AdapterBase, name: &str) -> Result<bool> {
    Ok(skill_path(base, name)?.join(SKILL_FILE).is_file())
}

pub(crate) fn get_skill(base: &AdapterBase, name: &str) -> Result<Skill> {
    let path = skill_path(base, name)?;
    if !path.join(SKILL_FILE).is_file() {
        return Err(base.not_found(ArtifactKind::Skill, name).into());
    }
    let mut skill = load_skill(&path)?;
    if skill.meta.name.is_empty() {
        skill.meta.name = name.to_string();
    }
    Ok(skill)
}

pub(crate) fn list_skills(base: &AdapterBase) -> Result<Vec<SkillInfo>> {
    let dir = base.require_dir(ArtifactKind::Skill)?;
    let mut infos = Vec::new();
    for path in entries(&dir)?.into_iter().filter(|p| p.is_dir()) {
        if !path.join(SKILL_FILE).is_file() {
            debug!(path = %path.display(), "No SKILL.md, skipping");
            continue;
        }
        match load_skill(&path) {
            Ok(skill) => infos.push(SkillInfo {
                name: file_name(&path),
                version: skill.meta.version(),
                description: skill.meta.description,
                path,
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable skill"),
        }
    }
    Ok(infos)
}

pub(crate) fn uninstall_skill(base: &AdapterBase, name: &str) -> Result<()> {
    let path = skill_path(base, name)?;
    if !path.is_dir() {
        return Err(base.not_found(ArtifactKind::Skill, name).into());
    }
    base.backup()?;
    fs::remove_dir_all(&path).map_err(|e| AixError::io("removing", &path, e))?;
    debug!(platform = %base.platform(), skill = name, "Removed skill");
    Ok(())
}

/// Writes `<agent-dir>/<name>.md`.
pub(crate) fn install_agent(base: &AdapterBase, agent: &Agent, report: &mut WriteReport) -> Result<()> {
    let path = item_path(base, ArtifactKind::Agent, agent.name(), "md")?;
    let rendered = frontmatter::format(&agent.meta, &agent.body)?;
    write_file(base, &path, &rendered, &format!("agent '{}'", agent.name()), report)
}

pub(crate) fn get_agent(base: &AdapterBase, name: &str) -> Result<Agent> {
    let path = item_path(base, ArtifactKind::Agent, name, "md")?;
    if !path.is_file() {
        return Err(base.not_found(ArtifactKind::Agent, name).into());
    }
    let mut agent = load_agent(&path)?;
    agent.meta.name = name.to_string();
    Ok(agent)
}

pub(crate) fn list_agents(base: &AdapterBase) -> Result<Vec<AgentInfo>> {
    let dir = base.require_dir(ArtifactKind::Agent)?;
    let mut infos = Vec::new();
    for path in files_with_extension(&dir, "md")? {
        match load_agent(&path) {
            Ok(agent) => infos.push(AgentInfo {
                name: stem(&path),
                description: agent.meta.description,
                model: agent.meta.model,
                path,
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable agent"),
        }
    }
    Ok(infos)
}

/// Writes a Markdown command. The name lives in the file name only.
pub(crate) fn install_command(
    base: &AdapterBase,
    name: &str,
    meta: &CommandMeta,
    body: &str,
    report: &mut WriteReport,
) -> Result<()> {
    let path = item_path(base, ArtifactKind::Command, name, "md")?;
    let meta = CommandMeta {
        name: String::new(),
        ..meta.clone()
    };
    let rendered = frontmatter::format(&meta, body)?;
    write_file(base, &path, &rendered, &format!("command '{name}'"), report)
}

pub(crate) fn get_command(base: &AdapterBase, name: &str) -> Result<Command> {
    let path = item_path(base, ArtifactKind::Command, name, "md")?;
    if !path.is_file() {
        return Err(base.not_found(ArtifactKind::Command, name).into());
    }
    let mut command = load_command(&path)?;
    command.meta.name = name.to_string();
    Ok(command)
}

pub(crate) fn list_commands(base: &AdapterBase) -> Result<Vec<CommandInfo>> {
    let dir = base.require_dir(ArtifactKind::Command)?;
    let mut infos = Vec::new();
    for path in files_with_extension(&dir, "md")? {
        match load_command(&path) {
            Ok(command) => infos.push(CommandInfo {
                name: stem(&path),
                description: command.meta.description,
                path,
            }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable command"),
        }
    }
    Ok(infos)
}

/// `<dir>/<name>.<ext>` for a single-file artifact.
pub(crate) fn item_path(
    base: &AdapterBase,
    kind: ArtifactKind,
    name: &str,
    ext: &str,
) -> Result<PathBuf> {
    check_name(kind, name)?;
    Ok(base.require_dir(kind)?.join(format!("{name}.{ext}")))
}

/// Writes `content` to `path` unless it already matches.
pub(crate) fn write_file(
    base: &AdapterBase,
    path: &Path,
    content: &str,
    item: &str,
    report: &mut WriteReport,
) -> Result<()> {
    if same_content(path, content.as_bytes()) {
        report.unchanged(item);
        return Ok(());
    }
    base.backup()?;
    atomic_write(path, content.as_bytes(), existing_mode_or(path, DEFAULT_FILE_MODE))?;
    report.written += 1;
    debug!(platform = %base.platform(), path = %path.display(), "Wrote {item}");
    Ok(())
}

pub(crate) fn remove_file(
    base: &AdapterBase,
    kind: ArtifactKind,
    name: &str,
    path: &Path,
) -> Result<()> {
    if !path.is_file() {
        return Err(base.not_found(kind, name).into());
    }
    base.backup()?;
    fs::remove_file(path).map_err(|e| AixError::io("removing", path, e))?;
    debug!(platform = %base.platform(), path = %path.display(), "Removed {kind}");
    Ok(())
}

/// Visible files in `dir` with extension `ext`, sorted by name. A missing
/// directory has none.
pub(crate) fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    Ok(entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .collect())
}

/// File name without extension.
pub(crate) fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| AixError::io("reading directory", dir, e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !is_hidden_component(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aix_state::{Paths, Platform};

    fn base(home: &Path) -> AdapterBase {
        AdapterBase::new(Platform::Claude, &Paths::with_home(home))
    }

    fn skill(name: &str, body: &str) -> Skill {
        Skill {
            meta: SkillMeta {
                name: name.into(),
                description: "d".into(),
                ..Default::default()
            },
            body: body.into(),
            source_dir: None,
        }
    }

    #[test]
    fn reinstalling_identical_skill_is_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let base = base(tmp.path());
        let s = skill("demo", "Body");

        let mut first = WriteReport::new();
        install_skill(&base, &s, &s.meta, &mut first).unwrap();
        assert_eq!(first.written, 1);

        let mut second = WriteReport::new();
        install_skill(&base, &s, &s.meta, &mut second).unwrap();
        assert!(second.is_unchanged());
    }

    #[test]
    fn resource_folders_are_copied() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src/demo");
        fs::create_dir_all(src.join("docs")).unwrap();
        fs::write(src.join("docs/usage.md"), "usage").unwrap();
        fs::create_dir_all(src.join("notes")).unwrap();
        fs::write(src.join("notes/skip.md"), "not a resource folder").unwrap();

        let mut s = skill("demo", "Body");
        s.source_dir = Some(src);
        let base = base(tmp.path());
        let mut report = WriteReport::new();
        install_skill(&base, &s, &s.meta, &mut report).unwrap();

        let installed = tmp.path().join(".claude/skills/demo");
        assert_eq!(fs::read_to_string(installed.join("docs/usage.md")).unwrap(), "usage");
        assert!(!installed.join("notes").exists());
        assert_eq!(report.written, 2);
    }

    #[test]
    fn list_skips_directories_without_skill_file() {
        let tmp = tempfile::tempdir().unwrap();
        let base = base(tmp.path());
        let s = skill("demo", "Body");
        install_skill(&base, &s, &s.meta, &mut WriteReport::new()).unwrap();
        fs::create_dir_all(tmp.path().join(".claude/skills/empty")).unwrap();
        fs::create_dir_all(tmp.path().join(".claude/skills/.hidden")).unwrap();

        let names: Vec<String> = list_skills(&base).unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["demo"]);
    }

    #[test]
    fn missing_items_are_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let base = base(tmp.path());
        let err = get_skill(&base, "ghost").unwrap_err();
        assert_eq!(aix_backup::classify(&err), aix_state::ErrorKind::NotFound);
        assert!(err.to_string().contains("skill 'ghost' not found in claude"));
        assert!(uninstall_skill(&base, "ghost").is_err());
        assert!(!exists_skill(&base, "ghost").unwrap());
    }

    #[test]
    fn files_with_extension_filters_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b.md", "a.md", "c.txt", ".d.md"] {
            fs::write(tmp.path().join(name), "x").unwrap();
        }
        let files = files_with_extension(tmp.path(), "md").unwrap();
        let names: Vec<String> = files.iter().map(|p| stem(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(files_with_extension(&tmp.path().join("missing"), "md").unwrap().is_empty());
    }
}
