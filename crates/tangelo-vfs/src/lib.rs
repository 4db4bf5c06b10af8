//! Per-identity virtual filesystem.
//!
//! The tree lives in an arena (`Vec<Node>`): directories own their children
//! through a name -> [`NodeId`] map, and every node carries a non-owning
//! parent index used only for path reconstruction. One [`FileSystem`] exists
//! per identity and also holds the shell session state (history, environment,
//! aliases, fake process table, uptime clock).

mod fs;
mod node;
mod snapshot;

pub use fs::{DEFAULT_MAX_SIZE, FileSystem, Process, basename, dirname};
pub use node::{Node, NodeId, NodeKind};
pub use snapshot::{FsSnapshot, NodeSnapshot};
