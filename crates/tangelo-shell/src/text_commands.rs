//! Text and inspection commands: reading files, searching, and disk usage.

use tangelo_types::error::{Result, TangeloError};
use tangelo_vfs::{FileSystem, NodeId, NodeKind, basename};

use crate::interpreter::{Command, ShellOutput, ShellRegistry};

fn usage_err(msg: impl Into<String>) -> TangeloError {
    TangeloError::Shell(msg.into())
}

/// Resolve a path to a file node, with command-prefixed diagnostics.
fn resolve_file(fs: &FileSystem, cmd: &str, path: &str) -> Result<NodeId> {
    let id = fs
        .resolve(path)
        .ok_or_else(|| usage_err(format!("{cmd}: {path}: No such file or directory")))?;
    if fs.node(id).is_dir() {
        return Err(usage_err(format!("{cmd}: {path}: Is a directory")));
    }
    Ok(id)
}

fn file_text(fs: &FileSystem, id: NodeId) -> String {
    match &fs.node(id).kind {
        NodeKind::File { content, .. } => String::from_utf8_lossy(content).into_owned(),
        NodeKind::Directory { .. } => String::new(),
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base == "/" {
        format!("/{name}")
    } else {
        format!("{base}/{name}")
    }
}

fn human_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1}M", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}B")
    }
}

// ---------------------------------------------------------------------------
// cat / head / tail
// ---------------------------------------------------------------------------

struct Cat;

impl Command for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn description(&self) -> &str {
        "Print file contents"
    }

    fn usage(&self) -> &str {
        "cat <file>..."
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        if args.is_empty() {
            return Err(usage_err("cat: missing operand"));
        }
        let mut parts = Vec::with_capacity(args.len());
        for &path in args {
            let id = resolve_file(fs, "cat", path)?;
            parts.push(file_text(fs, id));
        }
        Ok(ShellOutput::Text(parts.join("\n")))
    }
}

/// Shared by head and tail: `<cmd> [-n N] <file>`.
fn parse_line_window<'a>(cmd: &str, args: &[&'a str]) -> Result<(usize, &'a str)> {
    match args {
        [path] => Ok((10, *path)),
        ["-n", n, path] => n
            .parse()
            .map(|n| (n, *path))
            .map_err(|_| usage_err(format!("{cmd}: invalid line count: '{n}'"))),
        _ => Err(usage_err(format!("{cmd}: usage: {cmd} [-n N] <file>"))),
    }
}

struct Head;

impl Command for Head {
    fn name(&self) -> &str {
        "head"
    }

    fn description(&self) -> &str {
        "Print the first lines of a file"
    }

    fn usage(&self) -> &str {
        "head [-n N] <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let (n, path) = parse_line_window("head", args)?;
        let id = resolve_file(fs, "head", path)?;
        let text = file_text(fs, id);
        let lines: Vec<&str> = text.lines().take(n).collect();
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

struct Tail;

impl Command for Tail {
    fn name(&self) -> &str {
        "tail"
    }

    fn description(&self) -> &str {
        "Print the last lines of a file"
    }

    fn usage(&self) -> &str {
        "tail [-n N] <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let (n, path) = parse_line_window("tail", args)?;
        let id = resolve_file(fs, "tail", path)?;
        let text = file_text(fs, id);
        let all: Vec<&str> = text.lines().collect();
        let start = all.len().saturating_sub(n);
        Ok(ShellOutput::Text(all[start..].join("\n")))
    }
}

// ---------------------------------------------------------------------------
// grep / find
// ---------------------------------------------------------------------------

struct Grep;

impl Command for Grep {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Print lines containing a substring"
    }

    fn usage(&self) -> &str {
        "grep <pattern> <file>..."
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let Some((&pattern, paths)) = args.split_first() else {
            return Err(usage_err("grep: usage: grep <pattern> <file>..."));
        };
        if paths.is_empty() {
            return Err(usage_err("grep: usage: grep <pattern> <file>..."));
        }
        let prefix_path = paths.len() > 1;
        let mut matches = Vec::new();
        for &path in paths {
            let id = resolve_file(fs, "grep", path)?;
            let raw = match &fs.node(id).kind {
                NodeKind::File { content, .. } => content,
                NodeKind::Directory { .. } => continue,
            };
            let Ok(text) = std::str::from_utf8(raw) else {
                return Err(usage_err(format!(
                    "grep: {path}: binary file not supported"
                )));
            };
            for line in text.lines() {
                if line.contains(pattern) {
                    if prefix_path {
                        matches.push(format!("{path}:{line}"));
                    } else {
                        matches.push(line.to_string());
                    }
                }
            }
        }
        Ok(ShellOutput::Text(matches.join("\n")))
    }
}

struct Find;

impl Command for Find {
    fn name(&self) -> &str {
        "find"
    }

    fn description(&self) -> &str {
        "Find entries by exact name"
    }

    fn usage(&self) -> &str {
        "find <path> <name>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [start, name] = args else {
            return Err(usage_err("find: usage: find <path> <name>"));
        };
        let root = fs
            .resolve(start)
            .ok_or_else(|| usage_err(format!("find: {start}: No such file or directory")))?;
        let mut hits = Vec::new();
        // Walk (path, id) pairs: matching on the path's last component means
        // a hard link is found under its entry name, not the node's name.
        let mut stack = vec![(fs.path_of(root), root)];
        while let Some((path, id)) = stack.pop() {
            if path.rsplit('/').next() == Some(*name) {
                hits.push(path.clone());
            }
            if let Some(children) = fs.node(id).children() {
                // Reverse so the stack pops in sorted order.
                for (key, &child) in children.iter().rev() {
                    stack.push((join_path(&path, key), child));
                }
            }
        }
        if hits.is_empty() {
            return Ok(ShellOutput::text(format!("find: '{name}' not found")));
        }
        Ok(ShellOutput::Text(hits.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// wc / sort / uniq / rev
// ---------------------------------------------------------------------------

struct Wc;

impl Command for Wc {
    fn name(&self) -> &str {
        "wc"
    }

    fn description(&self) -> &str {
        "Count lines, words, and bytes"
    }

    fn usage(&self) -> &str {
        "wc <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("wc: usage: wc <file>"));
        };
        let id = resolve_file(fs, "wc", path)?;
        let text = file_text(fs, id);
        let lines = text.lines().count();
        let words = text.split_whitespace().count();
        let bytes = fs.node(id).size();
        Ok(ShellOutput::Text(format!("{lines:>7} {words:>7} {bytes:>7} {path}")))
    }
}

struct Sort;

impl Command for Sort {
    fn name(&self) -> &str {
        "sort"
    }

    fn description(&self) -> &str {
        "Print a file's lines in sorted order"
    }

    fn usage(&self) -> &str {
        "sort <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("sort: usage: sort <file>"));
        };
        let id = resolve_file(fs, "sort", path)?;
        let text = file_text(fs, id);
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort_unstable();
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

struct Uniq;

impl Command for Uniq {
    fn name(&self) -> &str {
        "uniq"
    }

    fn description(&self) -> &str {
        "Collapse adjacent duplicate lines"
    }

    fn usage(&self) -> &str {
        "uniq <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("uniq: usage: uniq <file>"));
        };
        let id = resolve_file(fs, "uniq", path)?;
        let text = file_text(fs, id);
        let mut out: Vec<&str> = Vec::new();
        for line in text.lines() {
            if out.last() != Some(&line) {
                out.push(line);
            }
        }
        Ok(ShellOutput::Text(out.join("\n")))
    }
}

struct Rev;

impl Command for Rev {
    fn name(&self) -> &str {
        "rev"
    }

    fn description(&self) -> &str {
        "Reverse each line of a file"
    }

    fn usage(&self) -> &str {
        "rev <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("rev: usage: rev <file>"));
        };
        let id = resolve_file(fs, "rev", path)?;
        let text = file_text(fs, id);
        let lines: Vec<String> = text
            .lines()
            .map(|l| l.chars().rev().collect())
            .collect();
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// du / df
// ---------------------------------------------------------------------------

struct Du;

impl Command for Du {
    fn name(&self) -> &str {
        "du"
    }

    fn description(&self) -> &str {
        "Show disk usage of a path"
    }

    fn usage(&self) -> &str {
        "du [path]"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let target = args.first().copied().unwrap_or(".");
        let id = fs
            .resolve(target)
            .ok_or_else(|| usage_err(format!("du: {target}: No such file or directory")))?;
        let base = fs.path_of(id);
        let mut lines = Vec::new();
        if let Some(children) = fs.node(id).children() {
            for (name, &child) in children {
                lines.push(format!(
                    "{}\t{}",
                    human_size(fs.tree_size(child)),
                    join_path(&base, name)
                ));
            }
        }
        lines.push(format!("{}\t{base}", human_size(fs.tree_size(id))));
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

struct Df;

impl Command for Df {
    fn name(&self) -> &str {
        "df"
    }

    fn description(&self) -> &str {
        "Show filesystem quota usage"
    }

    fn usage(&self) -> &str {
        "df"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let used = fs.total_size();
        let size = fs.max_size();
        let avail = size.saturating_sub(used);
        Ok(ShellOutput::Text(format!(
            "Filesystem      Size    Used   Avail\n/dev/simfs   {:>6} {:>7} {:>7}",
            human_size(size),
            human_size(used),
            human_size(avail)
        )))
    }
}

// ---------------------------------------------------------------------------
// download
// ---------------------------------------------------------------------------

struct Download;

impl Command for Download {
    fn name(&self) -> &str {
        "download"
    }

    fn description(&self) -> &str {
        "Send a file back as an attachment"
    }

    fn usage(&self) -> &str {
        "download <file>"
    }

    fn category(&self) -> &str {
        "text"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [path] = args else {
            return Err(usage_err("download: usage: download <file>"));
        };
        let id = resolve_file(fs, "download", path)?;
        let content = match &fs.node(id).kind {
            NodeKind::File { content, .. } => content.clone(),
            NodeKind::Directory { .. } => Vec::new(),
        };
        // Name the attachment after the path the caller gave; a hard link's
        // node carries the name it was first created under.
        let filename = match basename(path) {
            "" => fs.node(id).name.clone(),
            n => n.to_string(),
        };
        Ok(ShellOutput::Download { filename, content })
    }
}

/// Install the text and inspection command set.
pub fn register_text_commands(reg: &mut ShellRegistry) {
    reg.register(Box::new(Cat));
    reg.register(Box::new(Head));
    reg.register(Box::new(Tail));
    reg.register(Box::new(Grep));
    reg.register(Box::new(Find));
    reg.register(Box::new(Wc));
    reg.register(Box::new(Sort));
    reg.register(Box::new(Uniq));
    reg.register(Box::new(Rev));
    reg.register(Box::new(Du));
    reg.register(Box::new(Df));
    reg.register(Box::new(Download));
}

#[cfg(test)]
mod tests {
    use crate::builtin_registry;
    use crate::interpreter::ShellOutput;
    use tangelo_vfs::FileSystem;

    fn exec(fs: &mut FileSystem, line: &str) -> ShellOutput {
        builtin_registry().execute(line, fs)
    }

    fn text(fs: &mut FileSystem, line: &str) -> String {
        match exec(fs, line) {
            ShellOutput::Text(t) => t,
            ShellOutput::Download { filename, .. } => panic!("unexpected download: {filename}"),
        }
    }

    #[test]
    fn cat_and_errors() {
        let mut fs = FileSystem::new();
        text(&mut fs, "write f.txt hello");
        assert_eq!(text(&mut fs, "cat f.txt"), "hello");
        assert_eq!(
            text(&mut fs, "cat nope"),
            "cat: nope: No such file or directory"
        );
        text(&mut fs, "mkdir d");
        assert_eq!(text(&mut fs, "cat d"), "cat: d: Is a directory");
    }

    #[test]
    fn head_and_tail_windows() {
        let mut fs = FileSystem::new();
        let body: Vec<String> = (1..=15).map(|i| format!("line{i}")).collect();
        fs.create_file(fs.root(), "f", body.join("\n").into_bytes())
            .unwrap();
        let head = text(&mut fs, "head f");
        assert_eq!(head.lines().count(), 10);
        assert!(head.starts_with("line1\n"));
        let tail = text(&mut fs, "tail -n 3 f");
        assert_eq!(tail, "line13\nline14\nline15");
    }

    #[test]
    fn grep_substring_matching() {
        let mut fs = FileSystem::new();
        fs.create_file(fs.root(), "f", b"alpha\nbeta\ngamma beta\n".to_vec())
            .unwrap();
        assert_eq!(text(&mut fs, "grep beta f"), "beta\ngamma beta");
        assert_eq!(text(&mut fs, "grep zeta f"), "");
    }

    #[test]
    fn grep_rejects_binary() {
        let mut fs = FileSystem::new();
        fs.create_file(fs.root(), "bin", vec![0xff, 0xfe, 0x00])
            .unwrap();
        assert_eq!(
            text(&mut fs, "grep x bin"),
            "grep: bin: binary file not supported"
        );
    }

    #[test]
    fn grep_prefixes_paths_for_multiple_files() {
        let mut fs = FileSystem::new();
        text(&mut fs, "write a.txt needle here");
        text(&mut fs, "write b.txt no match");
        assert_eq!(text(&mut fs, "grep needle a.txt b.txt"), "a.txt:needle here");
    }

    #[test]
    fn find_walks_subdirectories() {
        let mut fs = FileSystem::new();
        text(&mut fs, "mkdir a");
        text(&mut fs, "mkdir a/b");
        text(&mut fs, "touch a/b/target.txt");
        text(&mut fs, "touch target.txt");
        assert_eq!(
            text(&mut fs, "find / target.txt"),
            "/a/b/target.txt\n/target.txt"
        );
        assert_eq!(text(&mut fs, "find / ghost"), "find: 'ghost' not found");
    }

    #[test]
    fn find_sees_links_under_their_entry_names() {
        let mut fs = FileSystem::new();
        text(&mut fs, "write a.txt data");
        text(&mut fs, "ln a.txt b.txt");
        assert_eq!(text(&mut fs, "find / b.txt"), "/b.txt");
        assert_eq!(text(&mut fs, "find / a.txt"), "/a.txt");
    }

    #[test]
    fn wc_counts() {
        let mut fs = FileSystem::new();
        fs.create_file(fs.root(), "f", b"one two\nthree\n".to_vec())
            .unwrap();
        let out = text(&mut fs, "wc f");
        let fields: Vec<&str> = out.split_whitespace().collect();
        assert_eq!(fields, vec!["2", "3", "14", "f"]);
    }

    #[test]
    fn sort_uniq_rev() {
        let mut fs = FileSystem::new();
        fs.create_file(fs.root(), "f", b"b\na\nb\n".to_vec()).unwrap();
        assert_eq!(text(&mut fs, "sort f"), "a\nb\nb");
        fs.create_file(fs.root(), "g", b"x\nx\ny\nx\n".to_vec())
            .unwrap();
        assert_eq!(text(&mut fs, "uniq g"), "x\ny\nx");
        fs.create_file(fs.root(), "h", b"abc\nxy\n".to_vec()).unwrap();
        assert_eq!(text(&mut fs, "rev h"), "cba\nyx");
    }

    #[test]
    fn du_totals_tree() {
        let mut fs = FileSystem::new();
        text(&mut fs, "mkdir d");
        fs.create_file(fs.resolve("/d").unwrap(), "f", vec![0u8; 100])
            .unwrap();
        let out = text(&mut fs, "du /");
        assert!(out.contains("100B\t/d"));
        assert!(out.ends_with("100B\t/"));
    }

    #[test]
    fn df_reports_quota() {
        let mut fs = FileSystem::new();
        fs.create_file(fs.root(), "f", vec![0u8; 2048]).unwrap();
        let out = text(&mut fs, "df");
        assert!(out.starts_with("Filesystem"));
        assert!(out.contains("/dev/simfs"));
        assert!(out.contains("5.0M"));
        assert!(out.contains("2.0K"));
    }

    #[test]
    fn download_returns_payload() {
        let mut fs = FileSystem::new();
        fs.create_file(fs.root(), "data.bin", vec![1, 2, 3]).unwrap();
        match exec(&mut fs, "download data.bin") {
            ShellOutput::Download { filename, content } => {
                assert_eq!(filename, "data.bin");
                assert_eq!(content, vec![1, 2, 3]);
            },
            ShellOutput::Text(t) => panic!("expected download, got: {t}"),
        }
    }

    #[test]
    fn download_names_links_after_the_requested_path() {
        let mut fs = FileSystem::new();
        text(&mut fs, "write a.txt data");
        text(&mut fs, "ln a.txt b.txt");
        match exec(&mut fs, "download b.txt") {
            ShellOutput::Download { filename, content } => {
                assert_eq!(filename, "b.txt");
                assert_eq!(content, b"data");
            },
            ShellOutput::Text(t) => panic!("expected download, got: {t}"),
        }
    }

    #[test]
    fn download_refuses_directories() {
        let mut fs = FileSystem::new();
        text(&mut fs, "mkdir d");
        assert_eq!(text(&mut fs, "download d"), "download: d: Is a directory");
    }
}
