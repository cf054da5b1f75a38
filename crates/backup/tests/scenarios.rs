use aix_backup::{ensure_backed_up, BackupError, BackupManager};
use aix_state::{atomic_write_json, file_mode, ErrorKind, Paths, Platform, DEFAULT_FILE_MODE};
use aix_test_utils::TestFixture;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs;

fn sha256(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[test]
fn backup_mutate_restore_is_byte_exact() {
    let fx = TestFixture::new().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);
    let config = paths.mcp_config_path(Platform::Claude);

    let original = "{\n  \"mcpServers\": {\n    \"a\": {\n      \"command\": \"x\"\n    }\n  }\n}\n";
    fs::write(&config, original).unwrap();

    let manifest = mgr.create(Platform::Claude, &[config.clone()]).unwrap();
    atomic_write_json(
        &config,
        &json!({"mcpServers": {"b": {"command": "y"}}}),
        DEFAULT_FILE_MODE,
    )
    .unwrap();
    assert_ne!(fs::read_to_string(&config).unwrap(), original);

    mgr.restore(Platform::Claude, &manifest.id).unwrap();
    assert_eq!(fs::read_to_string(&config).unwrap(), original);
}

#[test]
fn restore_reproduces_hash_and_mode_of_every_entry() {
    let fx = TestFixture::new().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);

    let skills = fx.claude_dir.join("skills/reviewer");
    fs::create_dir_all(&skills).unwrap();
    fs::write(skills.join("SKILL.md"), "---\nname: reviewer\n---\nBody\n").unwrap();
    fs::write(fx.claude_dir.join("settings.json"), "{}\n").unwrap();

    let manifest = mgr.create(Platform::Claude, &[fx.claude_dir.clone()]).unwrap();
    assert_eq!(manifest.files.len(), 2);

    fs::remove_dir_all(&fx.claude_dir).unwrap();
    mgr.restore(Platform::Claude, &manifest.id).unwrap();

    for entry in &manifest.files {
        let bytes = fs::read(&entry.original_path).unwrap();
        assert_eq!(sha256(&bytes), entry.sha256_hash);
        assert_eq!(
            file_mode(&fs::metadata(&entry.original_path).unwrap()),
            entry.mode
        );
    }
}

#[test]
fn tampered_backup_is_rejected_and_target_untouched() {
    let fx = TestFixture::new().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);
    let config = paths.mcp_config_path(Platform::Claude);
    fs::write(&config, "{\"mcpServers\":{}}\n").unwrap();

    let manifest = mgr.create(Platform::Claude, &[config.clone()]).unwrap();
    fs::write(&config, "{\"current\":true}\n").unwrap();

    let stored = mgr
        .platform_dir(Platform::Claude)
        .join(&manifest.id)
        .join(&manifest.files[0].rel_path);
    let mut bytes = fs::read(&stored).unwrap();
    bytes[0] ^= 0x01;
    fs::write(&stored, bytes).unwrap();

    let err = mgr.restore(Platform::Claude, &manifest.id).unwrap_err();
    assert!(matches!(err, BackupError::Corrupted { .. }));
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert_eq!(fs::read_to_string(&config).unwrap(), "{\"current\":true}\n");
}

#[test]
fn prune_keeps_most_recent() {
    let fx = TestFixture::new().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);
    let config = paths.mcp_config_path(Platform::Claude);

    let mut ids = Vec::new();
    for i in 0..5 {
        fs::write(&config, format!("{{\"n\":{i}}}")).unwrap();
        ids.push(mgr.create(Platform::Claude, &[config.clone()]).unwrap().id);
    }
    assert_eq!(mgr.list(Platform::Claude).unwrap().len(), 5);

    assert_eq!(mgr.prune(Platform::Claude, 2).unwrap(), 3);
    let remaining: Vec<String> = mgr
        .list(Platform::Claude)
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(remaining, vec![ids[4].clone(), ids[3].clone()]);

    // Idempotent.
    assert_eq!(mgr.prune(Platform::Claude, 2).unwrap(), 0);

    let dirs = fs::read_dir(mgr.platform_dir(Platform::Claude)).unwrap().count();
    assert_eq!(dirs, 2);

    assert_eq!(mgr.prune(Platform::Claude, 0).unwrap(), 2);
    assert!(matches!(
        mgr.list(Platform::Claude),
        Err(BackupError::NoBackupsFound { .. })
    ));
}

#[test]
fn latest_is_newest() {
    let fx = TestFixture::new().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);
    let config = paths.mcp_config_path(Platform::Gemini);
    fs::write(&config, "{}").unwrap();

    mgr.create(Platform::Gemini, &[config.clone()]).unwrap();
    let newest = mgr.create(Platform::Gemini, &[config]).unwrap();
    assert_eq!(mgr.latest(Platform::Gemini).unwrap().id, newest.id);
}

#[test]
fn hook_creates_exactly_one_backup_per_platform() {
    let fx = TestFixture::new().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);
    let config = paths.mcp_config_path(Platform::OpenCode);
    fs::write(&config, "{}").unwrap();

    for _ in 0..5 {
        ensure_backed_up(&mgr, Platform::OpenCode, &[config.clone()]).unwrap();
    }
    assert_eq!(mgr.list(Platform::OpenCode).unwrap().len(), 1);
}

#[test]
fn hook_without_existing_paths_creates_nothing() {
    let fx = TestFixture::empty().unwrap();
    let paths = Paths::with_home(fx.home_path());
    let mgr = BackupManager::new(&paths);

    let missing = paths.mcp_config_path(Platform::Codex);
    for _ in 0..3 {
        assert!(ensure_backed_up(&mgr, Platform::Codex, &[missing.clone()])
            .unwrap()
            .is_none());
    }
    assert!(matches!(
        mgr.list(Platform::Codex),
        Err(BackupError::NoBackupsFound { .. })
    ));
}
