//! At most one automatic backup per platform per process.
//!
//! Every mutating adapter operation calls [`ensure_backed_up`] with the files
//! it is about to touch. The first call for a `(backup root, platform)` pair
//! snapshots them; later calls are no-ops. A failed backup leaves the latch
//! open so the next call retries.

use aix_state::{env_backup_retention, Platform};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::engine::BackupManager;
use crate::error::BackupError;

type Key = (PathBuf, Platform);
type Latch = Arc<Mutex<bool>>;

static LATCHES: LazyLock<Mutex<HashMap<Key, Latch>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

fn latch_for(key: Key) -> Latch {
    Arc::clone(LATCHES.lock().entry(key).or_default())
}

/// Backs up `paths` unless this platform was already backed up in this
/// process.
///
/// Returns the new backup id, or `None` when nothing was written (latch
/// already consumed, empty `paths`, or none of the paths exist). Only a
/// backup that was actually written consumes the latch. After a new backup,
/// older ones beyond the retention count are pruned.
pub fn ensure_backed_up(
    manager: &BackupManager,
    platform: Platform,
    paths: &[PathBuf],
) -> Result<Option<String>, BackupError> {
    if paths.is_empty() {
        return Ok(None);
    }

    let latch = latch_for((manager.root().to_path_buf(), platform));
    let mut done = latch.lock();
    if *done {
        return Ok(None);
    }

    match manager.create(platform, paths) {
        Ok(manifest) => {
            *done = true;
            let keep = env_backup_retention();
            if let Err(e) = manager.prune(platform, keep) {
                warn!(platform = %platform, error = %e, "Automatic prune failed");
            }
            Ok(Some(manifest.id))
        }
        Err(BackupError::NoFiles) => {
            debug!(platform = %platform, "Nothing to back up yet");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Clears every latch.
pub fn reset_all() {
    LATCHES.lock().clear();
}

/// Clears the latches for one platform.
pub fn reset(platform: Platform) {
    LATCHES.lock().retain(|(_, p), _| *p != platform);
}
