//! Session state commands: history, environment variables, and aliases.

use tangelo_types::error::{Result, TangeloError};
use tangelo_vfs::FileSystem;

use crate::interpreter::{Command, HISTORY_DISPLAY, ShellOutput, ShellRegistry};

fn usage_err(msg: impl Into<String>) -> TangeloError {
    TangeloError::Shell(msg.into())
}

fn valid_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct History;

impl Command for History {
    fn name(&self) -> &str {
        "history"
    }

    fn description(&self) -> &str {
        "Show recent commands"
    }

    fn usage(&self) -> &str {
        "history"
    }

    fn category(&self) -> &str {
        "session"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let all = fs.history();
        let start = all.len().saturating_sub(HISTORY_DISPLAY);
        // Numbering is absolute so entries keep their index as history grows.
        let lines: Vec<String> = all[start..]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:>5}  {line}", start + i + 1))
            .collect();
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// export / env / unset
// ---------------------------------------------------------------------------

struct Export;

impl Command for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn description(&self) -> &str {
        "Set an environment variable"
    }

    fn usage(&self) -> &str {
        "export NAME=value"
    }

    fn category(&self) -> &str {
        "session"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [assignment] = args else {
            return Err(usage_err("export: usage: export NAME=value"));
        };
        let Some((name, value)) = assignment.split_once('=') else {
            return Err(usage_err("export: usage: export NAME=value"));
        };
        if !valid_var_name(name) {
            return Err(usage_err(format!("export: invalid variable name: '{name}'")));
        }
        fs.env_set(name, value);
        Ok(ShellOutput::text(""))
    }
}

struct Env;

impl Command for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn description(&self) -> &str {
        "List environment variables"
    }

    fn usage(&self) -> &str {
        "env"
    }

    fn category(&self) -> &str {
        "session"
    }

    fn execute(&self, _args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let lines: Vec<String> = fs
            .environment()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        Ok(ShellOutput::Text(lines.join("\n")))
    }
}

struct Unset;

impl Command for Unset {
    fn name(&self) -> &str {
        "unset"
    }

    fn description(&self) -> &str {
        "Remove an environment variable"
    }

    fn usage(&self) -> &str {
        "unset <name>"
    }

    fn category(&self) -> &str {
        "session"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [name] = args else {
            return Err(usage_err("unset: usage: unset <name>"));
        };
        fs.env_unset(name);
        Ok(ShellOutput::text(""))
    }
}

// ---------------------------------------------------------------------------
// alias / unalias
// ---------------------------------------------------------------------------

struct Alias;

impl Command for Alias {
    fn name(&self) -> &str {
        "alias"
    }

    fn description(&self) -> &str {
        "Define or list command aliases"
    }

    fn usage(&self) -> &str {
        "alias [name=expansion]"
    }

    fn category(&self) -> &str {
        "session"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        match args {
            [] => {
                let lines: Vec<String> = fs
                    .aliases()
                    .iter()
                    .map(|(k, v)| format!("alias {k}='{v}'"))
                    .collect();
                Ok(ShellOutput::Text(lines.join("\n")))
            },
            [arg] => {
                if let Some((name, expansion)) = arg.split_once('=') {
                    if name.is_empty() || expansion.is_empty() {
                        return Err(usage_err("alias: usage: alias name=expansion"));
                    }
                    fs.alias_set(name, expansion);
                    return Ok(ShellOutput::text(""));
                }
                match fs.alias_get(arg) {
                    Some(expansion) => {
                        Ok(ShellOutput::Text(format!("alias {arg}='{expansion}'")))
                    },
                    None => Err(usage_err(format!("alias: {arg}: not found"))),
                }
            },
            _ => Err(usage_err("alias: usage: alias [name=expansion]")),
        }
    }
}

struct Unalias;

impl Command for Unalias {
    fn name(&self) -> &str {
        "unalias"
    }

    fn description(&self) -> &str {
        "Remove an alias"
    }

    fn usage(&self) -> &str {
        "unalias <name>"
    }

    fn category(&self) -> &str {
        "session"
    }

    fn execute(&self, args: &[&str], fs: &mut FileSystem) -> Result<ShellOutput> {
        let [name] = args else {
            return Err(usage_err("unalias: usage: unalias <name>"));
        };
        if fs.alias_get(name).is_none() {
            return Err(usage_err(format!("unalias: {name}: not found")));
        }
        fs.alias_unset(name);
        Ok(ShellOutput::text(""))
    }
}

/// Install the session command set.
pub fn register_session_commands(reg: &mut ShellRegistry) {
    reg.register(Box::new(History));
    reg.register(Box::new(Export));
    reg.register(Box::new(Env));
    reg.register(Box::new(Unset));
    reg.register(Box::new(Alias));
    reg.register(Box::new(Unalias));
}
