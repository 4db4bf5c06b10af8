//! Tree nodes: a tagged File/Directory sum type stored in an arena.

use std::collections::BTreeMap;

/// Index of a node in the filesystem arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// Default permission string for new files.
pub(crate) const DEFAULT_PERMISSIONS: &str = "rw-";

/// File or directory payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
    File {
        content: Vec<u8>,
        /// 3 characters over `rwx-`.
        permissions: String,
        owner: String,
    },
    Directory {
        /// Name -> node. `BTreeMap` so listings come out sorted.
        children: BTreeMap<String, NodeId>,
    },
}

/// A single node in the tree.
///
/// `parent` is a plain arena index, never an owning handle: the owning
/// direction is strictly parent -> children. It exists so `pwd` can walk back
/// to the root.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    /// Unix seconds.
    pub created_at: i64,
    pub modified_at: i64,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn new_file(name: &str, content: Vec<u8>, owner: &str, now: i64) -> Self {
        Node {
            name: name.to_string(),
            parent: None,
            created_at: now,
            modified_at: now,
            kind: NodeKind::File {
                content,
                permissions: DEFAULT_PERMISSIONS.to_string(),
                owner: owner.to_string(),
            },
        }
    }

    pub(crate) fn new_dir(name: &str, now: i64) -> Self {
        Node {
            name: name.to_string(),
            parent: None,
            created_at: now,
            modified_at: now,
            kind: NodeKind::Directory {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Byte length of the content for files, 0 for directories.
    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::File { content, .. } => content.len() as u64,
            NodeKind::Directory { .. } => 0,
        }
    }

    /// Children map of a directory, or `None` for files.
    pub fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}

/// Validate a `chmod`-style permission string: exactly 3 chars over `rwx-`.
pub fn valid_permissions(perm: &str) -> bool {
    perm.len() == 3 && perm.chars().all(|c| matches!(c, 'r' | 'w' | 'x' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_tracks_content() {
        let f = Node::new_file("a.txt", b"hello".to_vec(), "user", 0);
        assert_eq!(f.size(), 5);
        assert!(f.is_file());
        assert!(!f.is_dir());
    }

    #[test]
    fn dir_has_no_size() {
        let d = Node::new_dir("docs", 0);
        assert_eq!(d.size(), 0);
        assert!(d.is_dir());
        assert!(d.children().unwrap().is_empty());
    }

    #[test]
    fn permission_validation() {
        assert!(valid_permissions("rwx"));
        assert!(valid_permissions("r--"));
        assert!(valid_permissions("---"));
        assert!(!valid_permissions("rw"));
        assert!(!valid_permissions("rwxr"));
        assert!(!valid_permissions("abc"));
        assert!(!valid_permissions("RWX"));
    }
}
