//! `aix backup ...` handlers.

use aix_backup::{BackupError, BackupManager, Manifest};
use aix_platform::adapter_for;
use aix_state::{env_backup_retention, AixError, Platform};
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;

use crate::app::{print_json, Context};
use crate::cli::BackupAction;

/// A backup as printed by `backup list`.
#[derive(Debug, Serialize)]
struct BackupView {
    platform: Platform,
    id: String,
    created_at: String,
    files: Vec<PathBuf>,
}

impl BackupView {
    fn new(manifest: &Manifest) -> Self {
        Self {
            platform: manifest.platform,
            id: manifest.id.clone(),
            created_at: manifest
                .created_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| manifest.created_at.to_string()),
            files: manifest.files.iter().map(|f| f.original_path.clone()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PruneView {
    platform: Platform,
    removed: usize,
}

/// Handle `aix backup ...`.
pub(crate) fn handle_backup_command(ctx: &Context, action: BackupAction, out: &mut dyn Write) -> Result<()> {
    let manager = BackupManager::new(ctx.paths);
    let platforms = ctx.platforms()?;
    match action {
        BackupAction::Create => create(ctx, &manager, &platforms, out),
        BackupAction::List => list(ctx, &manager, &platforms, out),
        BackupAction::Restore { id } => {
            let platform = owner(&manager, &platforms, &id)?;
            let manifest = manager.restore(platform, &id)?;
            if ctx.json {
                return print_json(out, &BackupView::new(&manifest));
            }
            writeln!(
                out,
                "{platform}: restored {} files from backup {id}",
                manifest.files.len()
            )?;
            Ok(())
        }
        BackupAction::Prune { keep } => {
            let keep = keep.unwrap_or_else(env_backup_retention);
            let mut pruned = Vec::new();
            for platform in platforms {
                let removed = manager.prune(platform, keep)?;
                pruned.push(PruneView { platform, removed });
            }
            if ctx.json {
                return print_json(out, &pruned);
            }
            for p in &pruned {
                writeln!(out, "{}: removed {} backups (keeping {keep})", p.platform, p.removed)?;
            }
            Ok(())
        }
        BackupAction::Verify { id } => {
            let platform = owner(&manager, &platforms, &id)?;
            let mismatches = manager.verify(platform, &id)?;
            if let Some(bad) = mismatches.into_iter().next() {
                return Err(BackupError::Corrupted {
                    path: bad.original_path,
                    expected: bad.expected,
                    actual: bad.actual.unwrap_or_else(|| "missing".to_string()),
                }
                .into());
            }
            let manifest = manager.get(platform, &id)?;
            if ctx.json {
                return print_json(out, &BackupView::new(&manifest));
            }
            writeln!(
                out,
                "{platform}: backup {id} is intact ({} files)",
                manifest.files.len()
            )?;
            Ok(())
        }
        BackupAction::Delete { id } => {
            let platform = owner(&manager, &platforms, &id)?;
            manager.delete(platform, &id)?;
            if ctx.json {
                return print_json(out, &serde_json::json!({ "platform": platform, "id": id }));
            }
            writeln!(out, "{platform}: deleted backup {id}")?;
            Ok(())
        }
    }
}

fn create(ctx: &Context, manager: &BackupManager, platforms: &[Platform], out: &mut dyn Write) -> Result<()> {
    let mut created = Vec::new();
    for &platform in platforms {
        let paths = adapter_for(platform, ctx.paths).backup_paths();
        match manager.create(platform, &paths) {
            Ok(manifest) => {
                if !ctx.json {
                    writeln!(
                        out,
                        "{platform}: created backup {} ({} files)",
                        manifest.id,
                        manifest.files.len()
                    )?;
                }
                created.push(BackupView::new(&manifest));
            }
            Err(BackupError::NoFiles) => {
                if !ctx.json {
                    writeln!(out, "{platform}: nothing to back up")?;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    if ctx.json {
        print_json(out, &created)?;
    }
    Ok(())
}

fn list(ctx: &Context, manager: &BackupManager, platforms: &[Platform], out: &mut dyn Write) -> Result<()> {
    let mut views = Vec::new();
    for &platform in platforms {
        match manager.list(platform) {
            Ok(manifests) => views.extend(manifests.iter().map(BackupView::new)),
            Err(BackupError::NoBackupsFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }
    if views.is_empty() {
        let searched: Vec<&str> = platforms.iter().map(|p| p.as_str()).collect();
        return Err(AixError::not_found("backups", searched.join(", ")).into());
    }
    if ctx.json {
        return print_json(out, &views);
    }
    for view in &views {
        writeln!(
            out,
            "{:<10} {:<24} {}  {} files",
            view.platform.as_str(),
            view.id,
            view.created_at,
            view.files.len()
        )?;
    }
    Ok(())
}

/// Finds the target platform holding backup `id`.
fn owner(manager: &BackupManager, platforms: &[Platform], id: &str) -> Result<Platform> {
    for &platform in platforms {
        match manager.get(platform, id) {
            Ok(_) => return Ok(platform),
            Err(BackupError::NotFound { .. }) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let searched: Vec<&str> = platforms.iter().map(|p| p.as_str()).collect();
    Err(AixError::not_found(format!("backup '{id}'"), searched.join(", ")).into())
}
