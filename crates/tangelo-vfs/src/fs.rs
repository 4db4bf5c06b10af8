//! The filesystem instance: tree mutation, path resolution, quota
//! accounting, and shell session state.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tangelo_types::error::{Result, TangeloError};

use crate::node::{Node, NodeId, NodeKind, valid_permissions};

/// Default per-filesystem storage quota: 5 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

/// An entry in the simulated process table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub pid: u32,
    pub name: String,
}

fn default_processes() -> Vec<Process> {
    [
        (1, "init"),
        (17, "kworker"),
        (42, "sshd"),
        (128, "cron"),
        (200, "sh"),
    ]
    .iter()
    .map(|&(pid, name)| Process {
        pid,
        name: name.to_string(),
    })
    .collect()
}

/// One identity's virtual filesystem plus its shell session state.
pub struct FileSystem {
    nodes: Vec<Node>,
    /// Recycled arena slots.
    free: Vec<NodeId>,
    root: NodeId,
    cwd: NodeId,
    total_size: u64,
    max_size: u64,
    hostname: String,
    /// Unix seconds at instance creation; `uptime` measures from here.
    uptime_start: i64,
    processes: Vec<Process>,
    history: Vec<String>,
    environment: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

impl FileSystem {
    /// Create an empty filesystem for the default user.
    pub fn new() -> Self {
        Self::for_user("user")
    }

    /// Create an empty filesystem owned by `username`.
    pub fn for_user(username: &str) -> Self {
        let ts = now();
        let root = Node::new_dir("/", ts);
        let mut environment = BTreeMap::new();
        environment.insert("USER".to_string(), username.to_string());
        environment.insert("HOME".to_string(), "/".to_string());
        environment.insert("SHELL".to_string(), "tangelo".to_string());
        FileSystem {
            nodes: vec![root],
            free: Vec::new(),
            root: NodeId(0),
            cwd: NodeId(0),
            total_size: 0,
            max_size: DEFAULT_MAX_SIZE,
            hostname: "tangelo".to_string(),
            uptime_start: ts,
            processes: default_processes(),
            history: Vec::new(),
            environment,
            aliases: BTreeMap::new(),
        }
    }

    // -- Node access --

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn cwd(&self) -> NodeId {
        self.cwd
    }

    /// Change the working directory. `id` must be a directory.
    pub fn set_cwd(&mut self, id: NodeId) -> Result<()> {
        if !self.node(id).is_dir() {
            return Err(TangeloError::Vfs("not a directory".to_string()));
        }
        self.cwd = id;
        Ok(())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = node;
            id
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() - 1)
        }
    }

    /// Drop a node's payload and recycle its slot.
    fn release(&mut self, id: NodeId) {
        self.nodes[id.0] = Node::new_dir("", 0);
        self.free.push(id);
    }

    // -- Path resolution --

    /// Resolve a path to a node. Absolute paths start from the root,
    /// relative paths from the working directory. `.` is skipped, `..`
    /// ascends (a no-op at the root), anything else must name an existing
    /// child.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        let (mut cur, rest) = if let Some(stripped) = path.strip_prefix('/') {
            (self.root, stripped)
        } else {
            (self.cwd, path.trim())
        };
        for part in rest.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    if let Some(parent) = self.node(cur).parent {
                        cur = parent;
                    }
                },
                name => {
                    cur = *self.node(cur).children()?.get(name)?;
                },
            }
        }
        Some(cur)
    }

    /// Absolute path of a node, reconstructed by walking parent references.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut path = String::new();
        let mut cur = id;
        while cur != self.root {
            let node = self.node(cur);
            path = format!("/{}{path}", node.name);
            match node.parent {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        if path.is_empty() { "/".to_string() } else { path }
    }

    /// Absolute path of the working directory.
    pub fn current_path(&self) -> String {
        self.path_of(self.cwd)
    }

    /// True if `id` is `other` or an ancestor of `other`.
    pub fn is_ancestor_of(&self, id: NodeId, other: NodeId) -> bool {
        let mut cur = Some(other);
        while let Some(c) = cur {
            if c == id {
                return true;
            }
            cur = self.node(c).parent;
        }
        false
    }

    // -- Quota --

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn set_max_size(&mut self, max: u64) {
        self.max_size = max;
    }

    /// True if adding `bytes` would push usage over the quota.
    pub fn would_exceed(&self, bytes: u64) -> bool {
        self.total_size + bytes > self.max_size
    }

    /// Number of directory entries referencing `id` (hard-link count).
    pub fn link_count(&self, id: NodeId) -> usize {
        self.nodes
            .iter()
            .filter_map(|n| n.children())
            .flat_map(|c| c.values())
            .filter(|&&child| child == id)
            .count()
    }

    /// Recursive sum of file sizes under `id` (files count their own size).
    pub fn tree_size(&self, id: NodeId) -> u64 {
        match self.node(id).children() {
            None => self.node(id).size(),
            Some(children) => {
                let ids: Vec<NodeId> = children.values().copied().collect();
                ids.iter().map(|&c| self.tree_size(c)).sum()
            },
        }
    }

    // -- Structural mutation --
    //
    // Every mutator that adds bytes checks the quota before touching the
    // tree, so a rejected operation leaves the tree unchanged.

    /// Create a directory named `name` under `parent`.
    pub fn make_dir(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.check_new_entry(parent, name)?;
        let ts = now();
        let id = self.alloc(Node::new_dir(name, ts));
        self.attach(parent, name, id, ts);
        Ok(id)
    }

    /// Create a file with the given content under `parent`.
    pub fn create_file(&mut self, parent: NodeId, name: &str, content: Vec<u8>) -> Result<NodeId> {
        self.check_new_entry(parent, name)?;
        let bytes = content.len() as u64;
        if self.would_exceed(bytes) {
            return Err(TangeloError::Vfs("storage quota exceeded".to_string()));
        }
        let ts = now();
        let owner = self.username();
        let id = self.alloc(Node::new_file(name, content, &owner, ts));
        self.attach(parent, name, id, ts);
        self.total_size += bytes;
        Ok(id)
    }

    /// Replace a file's content, adjusting quota accounting.
    pub fn write_file(&mut self, id: NodeId, new_content: Vec<u8>) -> Result<()> {
        let old = match &self.node(id).kind {
            NodeKind::File { content, .. } => content.len() as u64,
            NodeKind::Directory { .. } => {
                return Err(TangeloError::Vfs("is a directory".to_string()));
            },
        };
        let new = new_content.len() as u64;
        if new > old && self.would_exceed(new - old) {
            return Err(TangeloError::Vfs("storage quota exceeded".to_string()));
        }
        let ts = now();
        if let NodeKind::File { content, .. } = &mut self.node_mut(id).kind {
            *content = new_content;
        }
        self.node_mut(id).modified_at = ts;
        self.total_size = self.total_size - old + new;
        Ok(())
    }

    /// Bump a node's modification time.
    pub fn touch(&mut self, id: NodeId) {
        self.node_mut(id).modified_at = now();
    }

    /// Remove the entry `name` from `parent`. Directories must be empty and
    /// must not contain the working directory. A file's bytes are released
    /// from the quota only when its last link goes away.
    pub fn remove_entry(&mut self, parent: NodeId, name: &str) -> Result<()> {
        let id = *self
            .node(parent)
            .children()
            .and_then(|c| c.get(name))
            .ok_or_else(|| TangeloError::Vfs(format!("no such entry: {name}")))?;
        if self.node(id).is_dir() {
            if self
                .node(id)
                .children()
                .is_some_and(|c| !c.is_empty())
            {
                return Err(TangeloError::Vfs(format!("directory not empty: {name}")));
            }
            if self.is_ancestor_of(id, self.cwd) {
                return Err(TangeloError::Vfs(format!("directory in use: {name}")));
            }
        }
        let ts = now();
        if let NodeKind::Directory { children } = &mut self.node_mut(parent).kind {
            children.remove(name);
        }
        self.node_mut(parent).modified_at = ts;
        if self.link_count(id) == 0 {
            if self.node(id).is_file() {
                self.total_size -= self.node(id).size();
            }
            self.release(id);
        }
        Ok(())
    }

    /// Duplicate a file (content, permissions, owner) under a new parent.
    pub fn copy_file(&mut self, src: NodeId, dest_parent: NodeId, name: &str) -> Result<NodeId> {
        let (content, permissions, owner) = match &self.node(src).kind {
            NodeKind::File {
                content,
                permissions,
                owner,
            } => (content.clone(), permissions.clone(), owner.clone()),
            NodeKind::Directory { .. } => {
                return Err(TangeloError::Vfs("is a directory".to_string()));
            },
        };
        self.check_new_entry(dest_parent, name)?;
        let bytes = content.len() as u64;
        if self.would_exceed(bytes) {
            return Err(TangeloError::Vfs("storage quota exceeded".to_string()));
        }
        let ts = now();
        let mut node = Node::new_file(name, content, &owner, ts);
        if let NodeKind::File {
            permissions: perms, ..
        } = &mut node.kind
        {
            *perms = permissions;
        }
        let id = self.alloc(node);
        self.attach(dest_parent, name, id, ts);
        self.total_size += bytes;
        Ok(id)
    }

    /// Relink a node from `old_parent` to `new_parent` under `new_name`,
    /// touching both parents.
    pub fn move_entry(
        &mut self,
        old_parent: NodeId,
        name: &str,
        new_parent: NodeId,
        new_name: &str,
    ) -> Result<()> {
        let id = *self
            .node(old_parent)
            .children()
            .and_then(|c| c.get(name))
            .ok_or_else(|| TangeloError::Vfs(format!("no such entry: {name}")))?;
        self.check_new_entry(new_parent, new_name)?;
        if self.node(id).is_dir() && self.is_ancestor_of(id, new_parent) {
            return Err(TangeloError::Vfs(
                "cannot move a directory into itself".to_string(),
            ));
        }
        let ts = now();
        if let NodeKind::Directory { children } = &mut self.node_mut(old_parent).kind {
            children.remove(name);
        }
        self.node_mut(old_parent).modified_at = ts;
        self.attach(new_parent, new_name, id, ts);
        let node = self.node_mut(id);
        node.name = new_name.to_string();
        node.parent = Some(new_parent);
        Ok(())
    }

    /// Create a hard link: a second directory entry referencing the same
    /// file node. Directories cannot be linked.
    pub fn link_file(&mut self, src: NodeId, dest_parent: NodeId, name: &str) -> Result<()> {
        if !self.node(src).is_file() {
            return Err(TangeloError::Vfs("cannot link a directory".to_string()));
        }
        self.check_new_entry(dest_parent, name)?;
        let ts = now();
        if let NodeKind::Directory { children } = &mut self.node_mut(dest_parent).kind {
            children.insert(name.to_string(), src);
        }
        self.node_mut(dest_parent).modified_at = ts;
        Ok(())
    }

    /// Set a file or directory permission string (3 chars over `rwx-`).
    pub fn set_permissions(&mut self, id: NodeId, perm: &str) -> Result<()> {
        if !valid_permissions(perm) {
            return Err(TangeloError::Vfs(format!(
                "invalid permission string: {perm}"
            )));
        }
        match &mut self.node_mut(id).kind {
            NodeKind::File { permissions, .. } => {
                *permissions = perm.to_string();
                Ok(())
            },
            NodeKind::Directory { .. } => {
                Err(TangeloError::Vfs("not a regular file".to_string()))
            },
        }
    }

    /// Set a file's owner.
    pub fn set_owner(&mut self, id: NodeId, owner: &str) -> Result<()> {
        match &mut self.node_mut(id).kind {
            NodeKind::File { owner: o, .. } => {
                *o = owner.to_string();
                Ok(())
            },
            NodeKind::Directory { .. } => {
                Err(TangeloError::Vfs("not a regular file".to_string()))
            },
        }
    }

    /// Programmatic upload: place `content` as `filename` in the working
    /// directory. Rejected (tree untouched) if the name exists or the quota
    /// would be exceeded.
    pub fn add_file(&mut self, filename: &str, content: Vec<u8>) -> Result<()> {
        self.create_file(self.cwd, filename, content)?;
        Ok(())
    }

    fn check_new_entry(&self, parent: NodeId, name: &str) -> Result<()> {
        if name.is_empty() || name.contains('/') {
            return Err(TangeloError::Vfs(format!("invalid name: {name}")));
        }
        match self.node(parent).children() {
            None => Err(TangeloError::Vfs("not a directory".to_string())),
            Some(children) if children.contains_key(name) => {
                Err(TangeloError::Vfs(format!("entry exists: {name}")))
            },
            Some(_) => Ok(()),
        }
    }

    fn attach(&mut self, parent: NodeId, name: &str, id: NodeId, ts: i64) {
        if let NodeKind::Directory { children } = &mut self.node_mut(parent).kind {
            children.insert(name.to_string(), id);
        }
        self.node_mut(parent).modified_at = ts;
        self.node_mut(id).parent = Some(parent);
    }

    // -- Session state --

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn set_hostname(&mut self, hostname: &str) {
        self.hostname = hostname.to_string();
    }

    pub fn uptime_start(&self) -> i64 {
        self.uptime_start
    }

    /// Seconds since the instance was created, computed from the wall clock.
    pub fn uptime_secs(&self) -> i64 {
        (now() - self.uptime_start).max(0)
    }

    pub fn username(&self) -> String {
        self.environment
            .get("USER")
            .cloned()
            .unwrap_or_else(|| "user".to_string())
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Remove a process from the simulated table. Returns false if the pid
    /// is unknown.
    pub fn kill_process(&mut self, pid: u32) -> bool {
        let before = self.processes.len();
        self.processes.retain(|p| p.pid != pid);
        self.processes.len() != before
    }

    pub fn record_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn env_get(&self, name: &str) -> Option<&str> {
        self.environment.get(name).map(String::as_str)
    }

    pub fn env_set(&mut self, name: &str, value: &str) {
        self.environment
            .insert(name.to_string(), value.to_string());
    }

    pub fn env_unset(&mut self, name: &str) {
        self.environment.remove(name);
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn alias_get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn alias_set(&mut self, name: &str, expansion: &str) {
        self.aliases
            .insert(name.to_string(), expansion.to_string());
    }

    pub fn alias_unset(&mut self, name: &str) {
        self.aliases.remove(name);
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    // Snapshot support (crate-internal raw access).

    pub(crate) fn restore_session(
        &mut self,
        hostname: String,
        uptime_start: i64,
        processes: Vec<Process>,
        history: Vec<String>,
        environment: BTreeMap<String, String>,
        aliases: BTreeMap<String, String>,
    ) {
        self.hostname = hostname;
        self.uptime_start = uptime_start;
        self.processes = processes;
        self.history = history;
        self.environment = environment;
        self.aliases = aliases;
    }

    pub(crate) fn set_total_size(&mut self, total: u64) {
        self.total_size = total;
    }

    pub(crate) fn node_raw_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_mut(id)
    }

    pub(crate) fn alloc_raw(&mut self, node: Node) -> NodeId {
        self.alloc(node)
    }

    pub(crate) fn attach_raw(&mut self, parent: NodeId, name: &str, id: NodeId) {
        if let NodeKind::Directory { children } = &mut self.node_mut(parent).kind {
            children.insert(name.to_string(), id);
        }
        self.node_mut(id).parent = Some(parent);
    }
}

/// Directory part of a path (`a/b` -> `a`, `b` -> ``, `/b` -> `/`).
pub fn dirname(path: &str) -> &str {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(i) => &trimmed[..i],
        None => "",
    }
}

/// Final component of a path (`a/b` -> `b`, `/` -> ``).
pub fn basename(path: &str) -> &str {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
