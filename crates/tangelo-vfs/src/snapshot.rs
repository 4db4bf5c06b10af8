//! Persisted form of a filesystem instance.
//!
//! The schema is a nested object tree: a node with a `children` key is a
//! directory, anything else is a file. File content is stored as UTF-8
//! (lossy on the way out), matching the on-disk documents this replaces.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::fs::{DEFAULT_MAX_SIZE, FileSystem, Process};
use crate::node::{Node, NodeId, NodeKind};

/// One serialized node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
    /// Present for directories, absent for files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, NodeSnapshot>>,
}

fn default_hostname() -> String {
    "tangelo".to_string()
}

fn default_uptime_start() -> i64 {
    Utc::now().timestamp()
}

/// One serialized filesystem instance.
///
/// Session fields default when absent so documents written by older builds
/// still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsSnapshot {
    pub root: NodeSnapshot,
    pub current_path: String,
    pub total_size: u64,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_uptime_start")]
    pub uptime_start: i64,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl FileSystem {
    /// Serialize to the persisted form.
    ///
    /// Hard links are not representable in the nested schema; a linked file
    /// serializes as an independent copy under each of its names.
    pub fn to_snapshot(&self) -> FsSnapshot {
        FsSnapshot {
            root: self.node_snapshot(self.root()),
            current_path: self.current_path(),
            total_size: self.total_size(),
            hostname: self.hostname().to_string(),
            uptime_start: self.uptime_start(),
            processes: self.processes().to_vec(),
            history: self.history().to_vec(),
            environment: self.environment().clone(),
            aliases: self.aliases().clone(),
        }
    }

    fn node_snapshot(&self, id: NodeId) -> NodeSnapshot {
        let node = self.node(id);
        match &node.kind {
            NodeKind::File {
                content,
                permissions,
                owner,
            } => NodeSnapshot {
                name: node.name.clone(),
                content: Some(String::from_utf8_lossy(content).into_owned()),
                size: Some(content.len() as u64),
                permissions: Some(permissions.clone()),
                owner: Some(owner.clone()),
                created_at: node.created_at,
                modified_at: node.modified_at,
                children: None,
            },
            NodeKind::Directory { children } => NodeSnapshot {
                name: node.name.clone(),
                content: None,
                size: None,
                permissions: None,
                owner: None,
                created_at: node.created_at,
                modified_at: node.modified_at,
                children: Some(
                    children
                        .iter()
                        .map(|(name, &child)| (name.clone(), self.node_snapshot(child)))
                        .collect(),
                ),
            },
        }
    }

    /// Rebuild a live filesystem from its persisted form.
    ///
    /// `total_size` is recomputed from the tree; a mismatch against the
    /// stored figure is logged and the recomputed value wins.
    pub fn from_snapshot(snapshot: &FsSnapshot) -> Self {
        let mut fs = FileSystem::new();
        fs.set_max_size(DEFAULT_MAX_SIZE);
        fs.restore_session(
            snapshot.hostname.clone(),
            snapshot.uptime_start,
            snapshot.processes.clone(),
            snapshot.history.clone(),
            snapshot.environment.clone(),
            snapshot.aliases.clone(),
        );

        // Root metadata.
        let root = fs.root();
        {
            let ts = (snapshot.root.created_at, snapshot.root.modified_at);
            let node = fs.node_raw_mut(root);
            node.created_at = ts.0;
            node.modified_at = ts.1;
        }

        let mut total = 0u64;
        if let Some(children) = &snapshot.root.children {
            for (name, child) in children {
                restore_node(&mut fs, root, name, child, &mut total);
            }
        }
        fs.set_total_size(total);
        if total != snapshot.total_size {
            log::warn!(
                "snapshot total_size {} disagrees with tree sum {}; using tree sum",
                snapshot.total_size,
                total
            );
        }

        match fs.resolve(&snapshot.current_path) {
            Some(id) if fs.node(id).is_dir() => {
                // resolve() cannot fail for a freshly rebuilt tree path,
                // but a stale snapshot may point into a removed directory.
                let _ = fs.set_cwd(id);
            },
            _ => {
                log::warn!(
                    "snapshot current_path {:?} no longer resolves to a directory; resetting to /",
                    snapshot.current_path
                );
            },
        }
        fs
    }
}

fn restore_node(
    fs: &mut FileSystem,
    parent: NodeId,
    name: &str,
    snap: &NodeSnapshot,
    total: &mut u64,
) {
    match &snap.children {
        Some(children) => {
            let mut node = Node::new_dir(name, snap.created_at);
            node.modified_at = snap.modified_at;
            let id = fs.alloc_raw(node);
            fs.attach_raw(parent, name, id);
            for (child_name, child) in children {
                restore_node(fs, id, child_name, child, total);
            }
        },
        None => {
            let content = snap
                .content
                .as_deref()
                .unwrap_or_default()
                .as_bytes()
                .to_vec();
            *total += content.len() as u64;
            let owner = snap.owner.clone().unwrap_or_else(|| "user".to_string());
            let mut node = Node::new_file(name, content, &owner, snap.created_at);
            node.modified_at = snap.modified_at;
            if let (Some(perm), NodeKind::File { permissions, .. }) =
                (&snap.permissions, &mut node.kind)
            {
                *permissions = perm.clone();
            }
            let id = fs.alloc_raw(node);
            fs.attach_raw(parent, name, id);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_sample() -> FileSystem {
        let mut fs = FileSystem::new();
        let docs = fs.make_dir(fs.root(), "docs").unwrap();
        fs.create_file(docs, "a.txt", b"alpha".to_vec()).unwrap();
        let sub = fs.make_dir(docs, "sub").unwrap();
        fs.create_file(sub, "b.txt", b"beta!".to_vec()).unwrap();
        fs.set_cwd(docs).unwrap();
        fs.record_history("mkdir docs");
        fs.record_history("cd docs");
        fs.env_set("GREETING", "hi");
        fs.alias_set("ll", "ls");
        fs
    }

    #[test]
    fn roundtrip_preserves_tree_and_state() {
        let fs = build_sample();
        let snap = fs.to_snapshot();
        let restored = FileSystem::from_snapshot(&snap);

        assert_eq!(restored.current_path(), "/docs");
        assert_eq!(restored.total_size(), fs.total_size());
        assert_eq!(restored.history(), fs.history());
        assert_eq!(restored.environment(), fs.environment());
        assert_eq!(restored.aliases(), fs.aliases());
        assert_eq!(restored.hostname(), fs.hostname());
        assert_eq!(restored.uptime_start(), fs.uptime_start());

        let a = restored.resolve("/docs/a.txt").unwrap();
        match &restored.node(a).kind {
            NodeKind::File { content, .. } => assert_eq!(content, b"alpha"),
            NodeKind::Directory { .. } => panic!("expected file"),
        }
        assert!(restored.resolve("/docs/sub/b.txt").is_some());
    }

    #[test]
    fn roundtrip_through_json() {
        let fs = build_sample();
        let text = serde_json::to_string(&fs.to_snapshot()).unwrap();
        let snap: FsSnapshot = serde_json::from_str(&text).unwrap();
        let restored = FileSystem::from_snapshot(&snap);
        assert_eq!(restored.total_size(), fs.total_size());
        assert_eq!(restored.current_path(), "/docs");
    }

    #[test]
    fn file_vs_dir_distinguished_by_children_key() {
        let fs = build_sample();
        let value = serde_json::to_value(fs.to_snapshot()).unwrap();
        let docs = &value["root"]["children"]["docs"];
        assert!(docs.get("children").is_some());
        let file = &docs["children"]["a.txt"];
        assert!(file.get("children").is_none());
        assert_eq!(file["content"], "alpha");
    }

    #[test]
    fn stale_total_size_is_recomputed() {
        let fs = build_sample();
        let mut snap = fs.to_snapshot();
        snap.total_size = 9_999;
        let restored = FileSystem::from_snapshot(&snap);
        assert_eq!(restored.total_size(), fs.total_size());
    }

    #[test]
    fn stale_current_path_falls_back_to_root() {
        let fs = build_sample();
        let mut snap = fs.to_snapshot();
        snap.current_path = "/gone".to_string();
        let restored = FileSystem::from_snapshot(&snap);
        assert_eq!(restored.current_path(), "/");
    }

    #[test]
    fn minimal_legacy_document_loads() {
        // Oldest documents carried only root/current_path/total_size.
        let text = r#"{
            "root": {"name": "/", "created_at": 0, "modified_at": 0, "children": {}},
            "current_path": "/",
            "total_size": 0
        }"#;
        let snap: FsSnapshot = serde_json::from_str(text).unwrap();
        let restored = FileSystem::from_snapshot(&snap);
        assert_eq!(restored.current_path(), "/");
        assert_eq!(restored.hostname(), "tangelo");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn snapshot_roundtrip_any_tree(
                names in proptest::collection::btree_set("[a-z]{1,6}", 1..6),
                contents in proptest::collection::vec("[ -~]{0,32}", 6),
            ) {
                let mut fs = FileSystem::new();
                for (name, text) in names.iter().zip(contents.iter()) {
                    fs.create_file(fs.root(), name, text.as_bytes().to_vec()).unwrap();
                }
                let restored = FileSystem::from_snapshot(&fs.to_snapshot());
                prop_assert_eq!(restored.total_size(), fs.total_size());
                for name in &names {
                    prop_assert!(restored.resolve(name).is_some());
                }
            }
        }
    }
}
