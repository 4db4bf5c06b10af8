//! JSON persistence: atomic snapshot replace and legacy migration.
//!
//! Both documents are whole-store snapshots. Saving writes a temp file in
//! the target directory and renames it over the destination, so an
//! interrupted save never leaves a truncated document behind.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tangelo_types::error::Result;
use tangelo_registry::{CommandRecord, CommandStore};
use tangelo_vfs::FsSnapshot;

/// Serialize `value` to `path` via write-temp-then-rename.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Deserialize a document, tolerating absence and corruption: a missing
/// file yields the default, a malformed file is logged and yields the
/// default.
fn load_lenient<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::warn!(
                "malformed document at {}, starting empty: {e}",
                path.display()
            );
            Ok(T::default())
        },
    }
}

/// Load the command store, migrating the legacy flat-list layout if found.
///
/// Legacy layout: identity id -> bare record list (no scopes). Migration
/// backs the original file up as `<file>.bak.<unix-ts>` before rewriting,
/// and legacy records land in the private scope.
pub fn load_command_store(path: &Path) -> Result<CommandStore> {
    if !path.exists() {
        return Ok(CommandStore::new());
    }
    let raw = std::fs::read_to_string(path)?;
    if let Ok(store) = serde_json::from_str::<CommandStore>(&raw) {
        return Ok(store);
    }
    if let Ok(legacy) = serde_json::from_str::<BTreeMap<String, Vec<CommandRecord>>>(&raw) {
        log::info!("migrating legacy command store at {}", path.display());
        let backup = backup_path(path);
        std::fs::copy(path, &backup)?;
        let store = CommandStore::from_legacy(legacy);
        save_json(path, &store)?;
        return Ok(store);
    }
    log::warn!(
        "unrecognized command store at {}, starting empty",
        path.display()
    );
    Ok(CommandStore::new())
}

pub fn save_command_store(path: &Path, store: &CommandStore) -> Result<()> {
    save_json(path, store)
}

/// Load all persisted filesystem snapshots, keyed by identity id.
pub fn load_filesystem_snapshots(path: &Path) -> Result<BTreeMap<String, FsSnapshot>> {
    load_lenient(path)
}

pub fn save_filesystem_snapshots(
    path: &Path,
    snapshots: &BTreeMap<String, FsSnapshot>,
) -> Result<()> {
    save_json(path, snapshots)
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak.{}", Utc::now().timestamp()));
    std::path::PathBuf::from(name)
}
