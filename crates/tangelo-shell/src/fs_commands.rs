//! Filesystem commands: navigation, creation, removal, and file editing.

use chrono::{DateTime, Utc};
use tangelo_types::error::{Result, TangeloError};
use tangelo_vfs::{FileSystem, NodeId, NodeKind, basename};

use crate::interpreter::{Command, ShellOutput, ShellRegistry, split_target};

fn usage_err(msg: impl Into<String>) -> TangeloError {
    TangeloError::Shell(msg.into())
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|d| d.format("%b %d %H:%M").to_string())
        .unwrap_or_default()
}

/// Format one long-listing line. `name` is the directory-entry key, which
/// for a hard link differs from the node's own name.
fn long_entry(fs: &FileSystem, name: &str, id: NodeId) -> String {
    let node = fs.node(id);
    let (type_ch, perms, owner) = match &node.kind {
        NodeKind::File {
            permissions, owner, ..
        } => ('-', permissions.clone(), owner.clone()),
        NodeKind::Directory { .. } => ('d', "rwx".to_string(), fs.username()),
    };
    format!(
        "{type_ch}{perms} {:>8} {owner:<8} {} {name}",
        node.size(),
        format_timestamp(node.modified_at),
    )
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct Ls;

impl Command for Ls {
    fn name(&self) -> &str {
        "ls"
    }

    fn description(&self) -> &str {
        "List directory contents"
    }

    fn usage(&self) -> &str {
        "ls [-l] [path]"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let mut long = false;
        let mut path = None;
        for &a in args {
            if a == "-l" {
                long = true;
            } else {
                path = Some(a);
            }
        }
        let target = path.unwrap_or(".");
        let id = fs
            .resolve(target)
            .ok_or_else(|| usage_err(format!("ls: {target}: No such file or directory")))?;
        let node = fs.node(id);
        if node.is_file() {
            // Display the name the caller used, not the node's own name;
            // they differ when the path goes through a hard link.
            let shown = match basename(target) {
                "" => node.name.clone(),
                n => n.to_string(),
            };
            let line = if long {
                long_entry(fs, &shown, id)
            } else {
                shown
            };
            return Ok(ShellOutput::Text(line));
        }
        let entries: Vec<(String, NodeId)> = node
            .children()
            .map(|c| c.iter().map(|(k, &v)| (k.clone(), v)).collect())
            .unwrap_or_default();
        let lines: Vec<String> = if long {
            entries
                .iter()
                .map(|(name, c)| long_entry(fs, name, *c))
                .collect()
        } else {
            entries.iter().map(|(name, _)| name.clone()).collect()
        };
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// cd / pwd
// ---------------------------------------------------------------------------

struct Cd;

impl Command for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn description(&self) -> &str {
        "Change the working directory"
    }

    fn usage(&self) -> &str {
        "cd [path]"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let target = args.first().copied().unwrap_or("/");
        match fs.resolve(target) {
            Some(id) if fs.node(id).is_dir() => {
                fs.set_cwd(id)?;
                Ok(ShellOutput::text(""))
            },
            Some(_) => Err(usage_err(format!("cd: {target}: Not a directory"))),
            None => Err(usage_err(format!("cd: {target}: No such directory"))),
        }
    }
}

struct Pwd;

impl Command for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn description(&self) -> &str {
        "Print the working directory"
    }

    fn usage(&self) -> &str {
        "pwd"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        Ok(ShellOutput::Text(fs.current_path()))
    }
}

// ---------------------------------------------------------------------------
// mkdir / touch
// ---------------------------------------------------------------------------

struct Mkdir;

impl Command for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn description(&self) -> &str {
        "Create directories"
    }

    fn usage(&self) -> &str {
        "mkdir <dir>..."
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        if args.is_empty() {
            return Err(usage_err("mkdir: missing operand"));
        }
        for &path in args {
            let (parent, name) = split_target(fs, path).ok_or_else(|| {
                usage_err(format!(
                    "mkdir: cannot create directory '{path}': No such file or directory"
                ))
            })?;
            fs.make_dir(parent, &name).map_err(|_| {
                usage_err(format!(
                    "mkdir: cannot create directory '{path}': File exists"
                ))
            })?;
        }
        Ok(ShellOutput::text(""))
    }
}

struct Touch;

impl Command for Touch {
    fn name(&self) -> &str {
        "touch"
    }

    fn description(&self) -> &str {
        "Create empty files or update timestamps"
    }

    fn usage(&self) -> &str {
        "touch <file>..."
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        if args.is_empty() {
            return Err(usage_err("touch: missing file operand"));
        }
        for &path in args {
            if let Some(id) = fs.resolve(path) {
                fs.touch(id);
                continue;
            }
            let (parent, name) = split_target(fs, path).ok_or_else(|| {
                usage_err(format!(
                    "touch: cannot touch '{path}': No such file or directory"
                ))
            })?;
            fs.create_file(parent, &name, Vec::new())?;
        }
        Ok(ShellOutput::text(""))
    }
}

// ---------------------------------------------------------------------------
// rm / rmdir
// ---------------------------------------------------------------------------

struct Rm;

impl Command for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn description(&self) -> &str {
        "Remove files"
    }

    fn usage(&self) -> &str {
        "rm <file>..."
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        if args.is_empty() {
            return Err(usage_err("rm: missing operand"));
        }
        for &path in args {
            let (parent, name, id) = split_target(fs, path)
                .and_then(|(parent, name)| {
                    fs.node(parent)
                        .children()
                        .and_then(|c| c.get(&name))
                        .copied()
                        .map(|id| (parent, name, id))
                })
                .ok_or_else(|| {
                    usage_err(format!(
                        "rm: cannot remove '{path}': No such file or directory"
                    ))
                })?;
            if fs.node(id).is_dir() {
                return Err(usage_err(format!(
                    "rm: cannot remove '{path}': Is a directory"
                )));
            }
            fs.remove_entry(parent, &name)?;
        }
        Ok(ShellOutput::text(""))
    }
}

struct Rmdir;

impl Command for Rmdir {
    fn name(&self) -> &str {
        "rmdir"
    }

    fn description(&self) -> &str {
        "Remove empty directories"
    }

    fn usage(&self) -> &str {
        "rmdir <dir>..."
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        if args.is_empty() {
            return Err(usage_err("rmdir: missing operand"));
        }
        for &path in args {
            let found = split_target(fs, path).and_then(|(parent, name)| {
                fs.node(parent)
                    .children()
                    .and_then(|c| c.get(&name))
                    .copied()
                    .map(|id| (parent, name, id))
            });
            let Some((parent, name, id)) = found else {
                return Err(usage_err(format!(
                    "rmdir: failed to remove '{path}': No such file or directory"
                )));
            };
            if fs.node(id).is_file() {
                return Err(usage_err(format!(
                    "rmdir: failed to remove '{path}': Not a directory"
                )));
            }
            if fs.node(id).children().is_some_and(|c| !c.is_empty()) {
                return Err(usage_err(format!(
                    "rmdir: failed to remove '{path}': Directory not empty"
                )));
            }
            if fs.is_ancestor_of(id, fs.cwd()) {
                return Err(usage_err(format!(
                    "rmdir: failed to remove '{path}': Directory in use"
                )));
            }
            fs.remove_entry(parent, &name)?;
        }
        Ok(ShellOutput::text(""))
    }
}

// ---------------------------------------------------------------------------
// cp / mv / ln
// ---------------------------------------------------------------------------

/// Resolve a copy/move destination. An existing directory means "place
/// inside, keeping the source name"; anything else is a new entry name.
fn dest_slot(
    fs: &FileSystem,
    dest: &str,
    src_name: &str,
) -> Option<(NodeId, String)> {
    if let Some(id) = fs.resolve(dest)
        && fs.node(id).is_dir()
    {
        return Some((id, src_name.to_string()));
    }
    split_target(fs, dest)
}

struct Cp;

impl Command for Cp {
    fn name(&self) -> &str {
        "cp"
    }

    fn description(&self) -> &str {
        "Copy a file"
    }

    fn usage(&self) -> &str {
        "cp <src> <dest>"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [src, dest] = args else {
            return Err(usage_err("cp: usage: cp <src> <dest>"));
        };
        let src_id = fs
            .resolve(src)
            .ok_or_else(|| usage_err(format!("cp: {src}: No such file or directory")))?;
        if fs.node(src_id).is_dir() {
            return Err(usage_err(format!("cp: {src}: directory copy not supported")));
        }
        let src_name = match basename(src) {
            "" => fs.node(src_id).name.clone(),
            n => n.to_string(),
        };
        let (parent, name) = dest_slot(fs, dest, &src_name)
            .ok_or_else(|| usage_err(format!("cp: {dest}: No such file or directory")))?;
        fs.copy_file(src_id, parent, &name)?;
        Ok(ShellOutput::text(""))
    }
}

struct Mv;

impl Command for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn description(&self) -> &str {
        "Move or rename a file or directory"
    }

    fn usage(&self) -> &str {
        "mv <src> <dest>"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [src, dest] = args else {
            return Err(usage_err("mv: usage: mv <src> <dest>"));
        };
        let found = split_target(fs, src).filter(|(parent, name)| {
            fs.node(*parent)
                .children()
                .is_some_and(|c| c.contains_key(name))
        });
        let Some((old_parent, name)) = found else {
            return Err(usage_err(format!("mv: {src}: No such file or directory")));
        };
        let (new_parent, new_name) = dest_slot(fs, dest, &name)
            .ok_or_else(|| usage_err(format!("mv: {dest}: No such file or directory")))?;
        fs.move_entry(old_parent, &name, new_parent, &new_name)?;
        Ok(ShellOutput::text(""))
    }
}

struct Ln;

impl Command for Ln {
    fn name(&self) -> &str {
        "ln"
    }

    fn description(&self) -> &str {
        "Create a hard link to a file"
    }

    fn usage(&self) -> &str {
        "ln <target> <link>"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [target, link] = args else {
            return Err(usage_err("ln: usage: ln <target> <link>"));
        };
        let src = fs
            .resolve(target)
            .ok_or_else(|| usage_err(format!("ln: {target}: No such file or directory")))?;
        if fs.node(src).is_dir() {
            return Err(usage_err(format!(
                "ln: {target}: hard link not allowed for directory"
            )));
        }
        let (parent, name) = split_target(fs, link)
            .ok_or_else(|| usage_err(format!("ln: {link}: No such file or directory")))?;
        fs.link_file(src, parent, &name)?;
        Ok(ShellOutput::text(""))
    }
}

// ---------------------------------------------------------------------------
// chmod / chown
// ---------------------------------------------------------------------------

struct Chmod;

impl Command for Chmod {
    fn name(&self) -> &str {
        "chmod"
    }

    fn description(&self) -> &str {
        "Change file permissions"
    }

    fn usage(&self) -> &str {
        "chmod <mode> <file>"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [mode, path] = args else {
            return Err(usage_err("chmod: usage: chmod <mode> <file>"));
        };
        let id = fs
            .resolve(path)
            .ok_or_else(|| usage_err(format!("chmod: cannot access '{path}': No such file or directory")))?;
        if fs.node(id).is_dir() {
            return Err(usage_err(format!("chmod: {path}: Not a regular file")));
        }
        fs.set_permissions(id, mode).map_err(|_| {
            usage_err(format!("chmod: invalid mode: '{mode}' (use three of rwx-)"))
        })?;
        Ok(ShellOutput::text(""))
    }
}

struct Chown;

impl Command for Chown {
    fn name(&self) -> &str {
        "chown"
    }

    fn description(&self) -> &str {
        "Change file owner"
    }

    fn usage(&self) -> &str {
        "chown <owner> <file>"
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [owner, path] = args else {
            return Err(usage_err("chown: usage: chown <owner> <file>"));
        };
        let id = fs
            .resolve(path)
            .ok_or_else(|| usage_err(format!("chown: cannot access '{path}': No such file or directory")))?;
        if fs.node(id).is_dir() {
            return Err(usage_err(format!("chown: {path}: Not a regular file")));
        }
        fs.set_owner(id, owner)?;
        Ok(ShellOutput::text(""))
    }
}

// ---------------------------------------------------------------------------
// write / append
// ---------------------------------------------------------------------------

struct WriteCmd;

impl Command for WriteCmd {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write text to a file, replacing its content"
    }

    fn usage(&self) -> &str {
        "write <file> <text>..."
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let Some((&path, text)) = args.split_first() else {
            return Err(usage_err("write: usage: write <file> <text>..."));
        };
        let content = text.join(" ").into_bytes();
        let bytes = content.len();
        if let Some(id) = fs.resolve(path) {
            fs.write_file(id, content)?;
        } else {
            let (parent, name) = split_target(fs, path).ok_or_else(|| {
                usage_err(format!("write: {path}: No such file or directory"))
            })?;
            fs.create_file(parent, &name, content)?;
        }
        Ok(ShellOutput::Text(format!("Wrote {bytes} bytes to {path}")))
    }
}

struct Append;

impl Command for Append {
    fn name(&self) -> &str {
        "append"
    }

    fn description(&self) -> &str {
        "Append a line of text to a file"
    }

    fn usage(&self) -> &str {
        "append <file> <text>..."
    }

    fn category(&self) -> &str {
        "filesystem"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let Some((&path, text)) = args.split_first() else {
            return Err(usage_err("append: usage: append <file> <text>..."));
        };
        let addition = text.join(" ");
        if let Some(id) = fs.resolve(path) {
            let old = match &fs.node(id).kind {
                NodeKind::File { content, .. } => content.clone(),
                NodeKind::Directory { .. } => {
                    return Err(usage_err(format!("append: {path}: Is a directory")));
                },
            };
            let mut new = old;
            if !new.is_empty() {
                new.push(b'\n');
            }
            new.extend_from_slice(addition.as_bytes());
            let bytes = new.len();
            fs.write_file(id, new)?;
            return Ok(ShellOutput::Text(format!("Wrote {bytes} bytes to {path}")));
        }
        let (parent, name) = split_target(fs, path)
            .ok_or_else(|| usage_err(format!("append: {path}: No such file or directory")))?;
        let bytes = addition.len();
        fs.create_file(parent, &name, addition.into_bytes())?;
        Ok(ShellOutput::Text(format!("Wrote {bytes} bytes to {path}")))
    }
}

/// Install the filesystem command set.
pub fn register_fs_commands(reg: &mut ShellRegistry) {
    reg.register(Box::new(Ls));
    reg.register(Box::new(Cd));
    reg.register(Box::new(Pwd));
    reg.register(Box::new(Mkdir));
    reg.register(Box::new(Touch));
    reg.register(Box::new(Rm));
    reg.register(Box::new(Rmdir));
    reg.register(Box::new(Cp));
    reg.register(Box::new(Mv));
    reg.register(Box::new(Ln));
    reg.register(Box::new(Chmod));
    reg.register(Box::new(Chown));
    reg.register(Box::new(WriteCmd));
    reg.register(Box::new(Append));
}

#[cfg(test)]
mod tests {
    use crate::builtin_registry;
    use crate::interpreter::ShellOutput;
    use tangelo_vfs::FileSystem;

    fn exec(fs: &mut FileSystem, line: &str) -> String {
        match builtin_registry().execute(line, fs) {
            ShellOutput::Text(t) => t,
            ShellOutput::Download { filename, .. } => panic!("unexpected download: {filename}"),
        }
    }

    #[test]
    fn mkdir_touch_ls_scenario() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "mkdir projects"), "");
        assert_eq!(exec(&mut fs, "cd projects"), "");
        assert_eq!(exec(&mut fs, "touch a.txt"), "");
        assert_eq!(exec(&mut fs, "ls"), "a.txt");
        assert_eq!(exec(&mut fs, "pwd"), "/projects");
    }

    #[test]
    fn mkdir_duplicate_and_missing_parent() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "mkdir d");
        assert_eq!(
            exec(&mut fs, "mkdir d"),
            "mkdir: cannot create directory 'd': File exists"
        );
        assert_eq!(
            exec(&mut fs, "mkdir missing/sub"),
            "mkdir: cannot create directory 'missing/sub': No such file or directory"
        );
    }

    #[test]
    fn cd_errors() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "cd nowhere"), "cd: nowhere: No such directory");
        exec(&mut fs, "touch f");
        assert_eq!(exec(&mut fs, "cd f"), "cd: f: Not a directory");
        // cd with no argument goes home.
        exec(&mut fs, "mkdir d");
        exec(&mut fs, "cd d");
        exec(&mut fs, "cd");
        assert_eq!(exec(&mut fs, "pwd"), "/");
    }

    #[test]
    fn ls_long_lists_details() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "write notes.txt hello");
        let out = exec(&mut fs, "ls -l");
        assert!(out.starts_with("-rw-"));
        assert!(out.contains("notes.txt"));
        assert!(out.contains('5'));
    }

    #[test]
    fn ls_empty_directory() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "ls"), "");
    }

    #[test]
    fn rm_file_and_directory_refusal() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "touch f");
        exec(&mut fs, "mkdir d");
        assert_eq!(exec(&mut fs, "rm f"), "");
        assert_eq!(
            exec(&mut fs, "rm f"),
            "rm: cannot remove 'f': No such file or directory"
        );
        assert_eq!(exec(&mut fs, "rm d"), "rm: cannot remove 'd': Is a directory");
    }

    #[test]
    fn rmdir_rules() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "mkdir d");
        exec(&mut fs, "touch d/f");
        assert_eq!(
            exec(&mut fs, "rmdir d"),
            "rmdir: failed to remove 'd': Directory not empty"
        );
        exec(&mut fs, "rm d/f");
        exec(&mut fs, "cd d");
        assert_eq!(
            exec(&mut fs, "rmdir /d"),
            "rmdir: failed to remove '/d': Directory in use"
        );
        exec(&mut fs, "cd /");
        assert_eq!(exec(&mut fs, "rmdir d"), "");
        exec(&mut fs, "touch plain");
        assert_eq!(
            exec(&mut fs, "rmdir plain"),
            "rmdir: failed to remove 'plain': Not a directory"
        );
    }

    #[test]
    fn cp_into_directory_keeps_name() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "write f.txt data");
        exec(&mut fs, "mkdir d");
        assert_eq!(exec(&mut fs, "cp f.txt d"), "");
        assert_eq!(exec(&mut fs, "cat d/f.txt"), "data");
        assert_eq!(exec(&mut fs, "cp f.txt copy.txt"), "");
        assert_eq!(exec(&mut fs, "cat copy.txt"), "data");
    }

    #[test]
    fn cp_refuses_directories() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "mkdir d");
        assert_eq!(
            exec(&mut fs, "cp d elsewhere"),
            "cp: d: directory copy not supported"
        );
    }

    #[test]
    fn mv_renames_and_relocates() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "write f.txt data");
        exec(&mut fs, "mkdir d");
        assert_eq!(exec(&mut fs, "mv f.txt renamed.txt"), "");
        assert_eq!(exec(&mut fs, "mv renamed.txt d"), "");
        assert_eq!(exec(&mut fs, "cat d/renamed.txt"), "data");
        assert_eq!(exec(&mut fs, "ls"), "d");
    }

    #[test]
    fn ln_shares_content_until_last_unlink() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "write orig.txt shared");
        assert_eq!(exec(&mut fs, "ln orig.txt alias.txt"), "");
        exec(&mut fs, "rm orig.txt");
        assert_eq!(exec(&mut fs, "cat alias.txt"), "shared");
    }

    #[test]
    fn ln_listed_under_its_own_name() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "write a.txt data");
        exec(&mut fs, "ln a.txt b.txt");
        assert_eq!(exec(&mut fs, "ls"), "a.txt\nb.txt");
        let long = exec(&mut fs, "ls -l");
        assert!(long.lines().any(|l| l.ends_with(" a.txt")));
        assert!(long.lines().any(|l| l.ends_with(" b.txt")));
        assert_eq!(exec(&mut fs, "ls b.txt"), "b.txt");
        // cp through the link keeps the link's name too.
        exec(&mut fs, "mkdir d");
        assert_eq!(exec(&mut fs, "cp b.txt d"), "");
        assert_eq!(exec(&mut fs, "ls d"), "b.txt");
    }

    #[test]
    fn ln_refuses_directories() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "mkdir d");
        assert_eq!(
            exec(&mut fs, "ln d d2"),
            "ln: d: hard link not allowed for directory"
        );
    }

    #[test]
    fn chmod_and_chown() {
        let mut fs = FileSystem::new();
        exec(&mut fs, "touch f");
        assert_eq!(exec(&mut fs, "chmod r-- f"), "");
        assert_eq!(
            exec(&mut fs, "chmod 755 f"),
            "chmod: invalid mode: '755' (use three of rwx-)"
        );
        assert_eq!(exec(&mut fs, "chown alice f"), "");
        let out = exec(&mut fs, "ls -l");
        assert!(out.starts_with("-r--"));
        assert!(out.contains("alice"));
    }

    #[test]
    fn write_and_append() {
        let mut fs = FileSystem::new();
        assert_eq!(exec(&mut fs, "write log.txt first"), "Wrote 5 bytes to log.txt");
        assert_eq!(exec(&mut fs, "append log.txt second"), "Wrote 12 bytes to log.txt");
        assert_eq!(exec(&mut fs, "cat log.txt"), "first\nsecond");
        assert_eq!(exec(&mut fs, "write log.txt reset"), "Wrote 5 bytes to log.txt");
        assert_eq!(exec(&mut fs, "cat log.txt"), "reset");
    }

    #[test]
    fn write_quota_enforced() {
        let mut fs = FileSystem::new();
        fs.set_max_size(4);
        assert_eq!(exec(&mut fs, "write big.txt hello"), "storage quota exceeded");
        assert_eq!(exec(&mut fs, "ls"), "");
    }
}
