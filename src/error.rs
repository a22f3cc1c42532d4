#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error(
        "invalid status '{0}': expected one of \"To do\", \"Doing\", \"Done\" (or todo, to-do, doing, done)"
    )]
    InvalidStatus(String),

    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("malformed task file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config key '{0}'")]
    InvalidConfigKey(String),

    #[error("invalid config value for '{key}': {msg}")]
    InvalidConfigValue { key: String, msg: String },

    #[error("io error at {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}
