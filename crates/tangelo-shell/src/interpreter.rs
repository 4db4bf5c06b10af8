//! Command trait, registry, and dispatch logic.

use std::collections::HashMap;

use tangelo_types::error::{Result, TangeloError};
use tangelo_vfs::FileSystem;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutput {
    /// Plain text (possibly empty).
    Text(String),
    /// A payload the caller must deliver as a file attachment, not text.
    Download { filename: String, content: Vec<u8> },
}

impl ShellOutput {
    pub fn text(s: impl Into<String>) -> Self {
        ShellOutput::Text(s.into())
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types). Matching is case-sensitive.
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[path\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute against the filesystem. `Err(TangeloError::Shell(..))` is a
    /// usage diagnostic and is rendered as plain text by the registry.
    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput>;
}

/// Ceiling on recursive alias re-dispatch. An alias that refers to itself
/// (directly or through a cycle) hits this and gets a diagnostic.
const MAX_ALIAS_DEPTH: usize = 8;

/// Number of history entries shown by `history`.
pub(crate) const HISTORY_DISPLAY: usize = 20;

/// Registry of available commands with dispatch.
pub struct ShellRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl ShellRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ShellRegistry {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Look up a registered command.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(Box::as_ref)
    }

    /// Sorted list of registered command names.
    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse and execute one command line.
    ///
    /// The raw line is always recorded in history first, even when it is
    /// empty or malformed. Expected misuse never surfaces as an error; the
    /// result is always a printable output or a download payload.
    pub fn execute(&self, line: &str, fs: &mut FileSystem) -> ShellOutput {
        fs.record_history(line);
        if line.trim().is_empty() {
            return ShellOutput::text("(empty command)");
        }
        self.dispatch(line, fs)
    }

    fn dispatch(&self, line: &str, fs: &mut FileSystem) -> ShellOutput {
        let mut tokens = match tokenize_expanded(line, fs) {
            Ok(t) => t,
            Err(e) => return render_error(e),
        };

        // Alias expansion replaces the first token with the tokenized alias
        // body, so the quoting of the remaining arguments survives intact.
        let mut depth = 0;
        while let Some(expansion) = tokens
            .first()
            .and_then(|verb| fs.alias_get(verb))
            .map(str::to_string)
        {
            depth += 1;
            if depth > MAX_ALIAS_DEPTH {
                return ShellOutput::text("alias: expansion too deep (alias loop?)");
            }
            let mut head = match tokenize_expanded(&expansion, fs) {
                Ok(t) => t,
                Err(e) => return render_error(e),
            };
            head.extend(tokens.drain(1..));
            tokens = head;
        }

        let Some(verb) = tokens.first() else {
            return ShellOutput::text("(empty command)");
        };

        if verb == "help" {
            return self.execute_help(&tokens[1..]);
        }

        let arg_strings: Vec<&str> = tokens[1..].iter().map(String::as_str).collect();
        match self.commands.get(verb.as_str()) {
            Some(cmd) => match cmd.execute(&arg_strings, fs) {
                Ok(output) => output,
                Err(e) => render_error(e),
            },
            None => ShellOutput::text(format!("{verb}: command not found")),
        }
    }

    /// `help` lives on the registry because it needs the command table.
    fn execute_help(&self, args: &[String]) -> ShellOutput {
        if let Some(name) = args.first() {
            return match self.commands.get(name.as_str()) {
                Some(cmd) => ShellOutput::text(format!(
                    "{} ({})\n  {}\n  Usage: {}",
                    cmd.name(),
                    cmd.category(),
                    cmd.description(),
                    cmd.usage()
                )),
                None => ShellOutput::text(format!("help: {name}: command not found")),
            };
        }
        let mut names = self.command_names();
        names.push("help");
        names.sort_unstable();
        let mut out = String::from("Available commands:\n");
        out.push_str(&names.join("\n"));
        ShellOutput::Text(out)
    }
}

impl Default for ShellRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Usage diagnostics travel as `Shell`/`Vfs` errors and render bare; anything
/// else is an internal failure, logged and hidden behind a generic message.
fn render_error(e: TangeloError) -> ShellOutput {
    match e {
        TangeloError::Shell(msg) | TangeloError::Vfs(msg) => ShellOutput::Text(msg),
        other => {
            log::error!("internal shell error: {other}");
            ShellOutput::text("An internal error occurred while executing the command.")
        },
    }
}

// ---------------------------------------------------------------------------
// Tokenizer: quotes, backslash escapes, and $VAR/${VAR} expansion.
// ---------------------------------------------------------------------------

/// Tokenize a command line respecting quotes and backslash escapes, without
/// variable expansion.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    tokenize_with(input, None)
}

/// Tokenize with `$VAR`/`${VAR}` expansion against the filesystem
/// environment. Single-quoted text stays literal; bare and double-quoted
/// text expands.
fn tokenize_expanded(input: &str, fs: &FileSystem) -> Result<Vec<String>> {
    tokenize_with(input, Some(fs))
}

fn unterminated() -> TangeloError {
    TangeloError::Shell("shell: unterminated quote".to_string())
}

fn tokenize_with(input: &str, env: Option<&FileSystem>) -> Result<Vec<String>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' => {
                quoted = true;
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('\'') => {
                            i += 1;
                            break;
                        },
                        Some(&c) => {
                            current.push(c);
                            i += 1;
                        },
                        None => return Err(unterminated()),
                    }
                }
            },
            '"' => {
                quoted = true;
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('"') => {
                            i += 1;
                            break;
                        },
                        Some('\\') if matches!(chars.get(i + 1), Some('"' | '\\' | '$')) => {
                            current.push(chars[i + 1]);
                            i += 2;
                        },
                        Some('$') => {
                            i = consume_variable(&chars, i, env, &mut current);
                        },
                        Some(&c) => {
                            current.push(c);
                            i += 1;
                        },
                        None => return Err(unterminated()),
                    }
                }
            },
            '\\' => match chars.get(i + 1) {
                Some(&c) => {
                    current.push(c);
                    i += 2;
                },
                None => {
                    current.push('\\');
                    i += 1;
                },
            },
            '$' => {
                i = consume_variable(&chars, i, env, &mut current);
            },
            c if c.is_whitespace() => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
                i += 1;
            },
            c => {
                current.push(c);
                i += 1;
            },
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Consume a `$VAR` or `${VAR}` reference starting at `chars[start] == '$'`,
/// appending its value (or a literal `$` when there is no environment or no
/// name follows) and returning the index just past the reference.
fn consume_variable(
    chars: &[char],
    start: usize,
    env: Option<&FileSystem>,
    out: &mut String,
) -> usize {
    let Some(fs) = env else {
        out.push('$');
        return start + 1;
    };
    let i = start + 1;
    if chars.get(i) == Some(&'{') {
        if let Some(end) = chars[i + 1..].iter().position(|&c| c == '}') {
            let name: String = chars[i + 1..i + 1 + end].iter().collect();
            out.push_str(fs.env_get(&name).unwrap_or_default());
            return i + end + 2;
        }
        out.push('$');
        return start + 1;
    }
    let mut end = i;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    if end == i {
        out.push('$');
        return start + 1;
    }
    let name: String = chars[i..end].iter().collect();
    out.push_str(fs.env_get(&name).unwrap_or_default());
    end
}

/// Join a possibly relative path against the working directory and resolve
/// the `dirname` part to a parent directory, returning `(parent, basename)`.
/// Used by every command that creates or removes an entry.
pub(crate) fn split_target(
    fs: &FileSystem,
    path: &str,
) -> Option<(tangelo_vfs::NodeId, String)> {
    let name = tangelo_vfs::basename(path).to_string();
    if name.is_empty() {
        return None;
    }
    let parent = fs.resolve(tangelo_vfs::dirname(path))?;
    if !fs.node(parent).is_dir() {
        return None;
    }
    Some((parent, name))
}
