// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("notifier event channel closed unexpectedly")]
    NotifierClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure to register (or keep) a directory watch with the notifier.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The OS refused because too many watches or descriptors are in use.
    /// Continuing would silently miss changes.
    #[error("watch limit reached while watching {path:?}: {message}")]
    LimitReached { path: PathBuf, message: String },

    /// The directory disappeared before it could be watched.
    #[error("path vanished before it could be watched: {0:?}")]
    PathGone(PathBuf),

    #[error("failed to watch {path:?}: {message}")]
    Failed { path: PathBuf, message: String },
}

impl WatchError {
    /// Whether the whole pipeline must stop because of this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::LimitReached { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SettleError>;
