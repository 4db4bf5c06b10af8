//! Error types for tangelo.

use std::io;

/// Errors produced by the tangelo core.
#[derive(Debug, thiserror::Error)]
pub enum TangeloError {
    #[error("VFS error: {0}")]
    Vfs(String),

    #[error("shell error: {0}")]
    Shell(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("persistence error: {0}")]
    Persist(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TangeloError>;
