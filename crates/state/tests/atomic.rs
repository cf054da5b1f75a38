use aix_state::{atomic_write, atomic_write_json, DEFAULT_FILE_MODE};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

fn leftover_temps(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(".aix-atomic-") && name.ends_with(".tmp")
        })
        .count()
}

fn payload(writer: usize) -> Vec<u8> {
    // Large enough that a torn write would be visible.
    let line = format!("writer-{writer:02}:");
    line.repeat(4096).into_bytes()
}

#[test]
fn concurrent_writers_never_interleave() {
    let tmp = tempfile::tempdir().unwrap();
    let path = Arc::new(tmp.path().join("shared.json"));
    let payloads: Arc<Vec<Vec<u8>>> = Arc::new((0..10).map(payload).collect());

    let handles: Vec<_> = (0..10)
        .map(|w| {
            let path = Arc::clone(&path);
            let payloads = Arc::clone(&payloads);
            thread::spawn(move || {
                for _ in 0..50 {
                    atomic_write(&path, &payloads[w], DEFAULT_FILE_MODE).unwrap();
                    let seen = fs::read(&*path).unwrap();
                    assert!(
                        payloads.iter().any(|p| *p == seen),
                        "reader observed a mixed or partial payload"
                    );
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let last = fs::read(&*path).unwrap();
    assert!(payloads.iter().any(|p| *p == last));
    assert_eq!(leftover_temps(tmp.path()), 0);
}

#[cfg(unix)]
#[test]
fn readonly_parent_fails_and_keeps_original() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("ro");
    fs::create_dir(&dir).unwrap();
    let path = dir.join("settings.json");
    fs::write(&path, "{\"original\":true}\n").unwrap();
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users bypass directory permissions; nothing to assert then.
    let probe = dir.join("probe");
    if fs::write(&probe, "x").is_ok() {
        let _ = fs::remove_file(&probe);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let err = atomic_write_json(&path, &serde_json::json!({"new": true}), DEFAULT_FILE_MODE)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.starts_with("creating temp file"), "unexpected error: {msg}");
    assert!(msg.to_lowercase().contains("permission denied"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"original\":true}\n");
    assert_eq!(leftover_temps(&dir), 0);

    fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
}
