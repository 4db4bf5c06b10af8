//! Shell-like command interpreter over the virtual filesystem.
//!
//! Commands implement the [`Command`] trait and are registered by name. The
//! interpreter records the raw line in history, expands `$VAR` references and
//! aliases, tokenizes, and dispatches. Every expected-misuse path comes back
//! as a diagnostic string; callers never see an error for bad user input.

mod fs_commands;
mod interpreter;
mod session_commands;
mod system_commands;
mod text_commands;

pub use fs_commands::register_fs_commands;
pub use interpreter::{Command, ShellOutput, ShellRegistry, tokenize};
pub use session_commands::register_session_commands;
pub use system_commands::register_system_commands;
pub use text_commands::register_text_commands;

/// Build a registry with every built-in command installed.
pub fn builtin_registry() -> ShellRegistry {
    let mut reg = ShellRegistry::new();
    register_fs_commands(&mut reg);
    register_text_commands(&mut reg);
    register_system_commands(&mut reg);
    register_session_commands(&mut reg);
    reg
}
