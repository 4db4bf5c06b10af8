//! Shared application state: the command store and per-identity filesystems.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tangelo_registry::CommandStore;
use tangelo_shell::{ShellRegistry, builtin_registry};
use tangelo_template::BankProvider;
use tangelo_types::error::Result;
use tangelo_vfs::{FileSystem, FsSnapshot};

use crate::config::Config;
use crate::persist;

type FsMap = BTreeMap<String, Arc<Mutex<FileSystem>>>;

/// Everything one running instance shares across invocations.
///
/// The command store sits behind a single mutex because public-scope scans
/// need a whole-store view. Filesystems are per-identity `Arc<Mutex<_>>`
/// entries in an `RwLock`ed map, so two identities' shell sessions never
/// contend with each other.
pub struct AppState {
    config: Config,
    commands: Mutex<CommandStore>,
    filesystems: RwLock<FsMap>,
    shell: ShellRegistry,
    bank: Box<dyn BankProvider + Send + Sync>,
}

impl AppState {
    /// Fresh empty state, nothing read from disk.
    pub fn new(config: Config, bank: Box<dyn BankProvider + Send + Sync>) -> Self {
        AppState {
            config,
            commands: Mutex::new(CommandStore::new()),
            filesystems: RwLock::new(BTreeMap::new()),
            shell: builtin_registry(),
            bank,
        }
    }

    /// Load persisted state from the configured paths.
    pub fn load(config: Config, bank: Box<dyn BankProvider + Send + Sync>) -> Result<Self> {
        let commands = persist::load_command_store(&config.command_store_path())?;
        let snapshots = persist::load_filesystem_snapshots(&config.filesystem_store_path())?;
        let filesystems: FsMap = snapshots
            .iter()
            .map(|(id, snap)| {
                let mut fs = FileSystem::from_snapshot(snap);
                fs.set_max_size(config.fs_quota_bytes);
                (id.clone(), Arc::new(Mutex::new(fs)))
            })
            .collect();
        Ok(AppState {
            config,
            commands: Mutex::new(commands),
            filesystems: RwLock::new(filesystems),
            shell: builtin_registry(),
            bank,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shell(&self) -> &ShellRegistry {
        &self.shell
    }

    pub fn bank(&self) -> &dyn BankProvider {
        self.bank.as_ref()
    }

    /// Lock the command store. A poisoned lock is recovered rather than
    /// propagated; the store has no invariant a panic can half-apply that
    /// persistence would not also have.
    pub fn commands(&self) -> MutexGuard<'_, CommandStore> {
        self.commands.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn filesystems_read(&self) -> RwLockReadGuard<'_, FsMap> {
        self.filesystems.read().unwrap_or_else(|e| e.into_inner())
    }

    fn filesystems_write(&self) -> RwLockWriteGuard<'_, FsMap> {
        self.filesystems.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The filesystem for `identity`, created lazily on first use.
    pub fn filesystem(&self, identity: &str, username: &str) -> Arc<Mutex<FileSystem>> {
        if let Some(fs) = self.filesystems_read().get(identity) {
            return Arc::clone(fs);
        }
        let mut map = self.filesystems_write();
        let entry = map.entry(identity.to_string()).or_insert_with(|| {
            log::info!("creating filesystem for identity {identity}");
            let mut fs = FileSystem::for_user(username);
            fs.set_max_size(self.config.fs_quota_bytes);
            Arc::new(Mutex::new(fs))
        });
        Arc::clone(entry)
    }

    /// Persist both documents to the configured paths.
    pub fn save(&self) -> Result<()> {
        persist::save_command_store(&self.config.command_store_path(), &self.commands())?;
        let snapshots: BTreeMap<String, FsSnapshot> = self
            .filesystems_read()
            .iter()
            .map(|(id, fs)| {
                let fs = fs.lock().unwrap_or_else(|e| e.into_inner());
                (id.clone(), fs.to_snapshot())
            })
            .collect();
        persist::save_filesystem_snapshots(&self.config.filesystem_store_path(), &snapshots)
    }
}
