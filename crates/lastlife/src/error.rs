//! # Error Types
//!
//! Errors from the store, the configuration loader and the engine's
//! constructor and administrator operations. World-event handlers never
//! return these; they log them and move on.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from a [`crate::store::PlayerStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value does not start with the expected magic bytes.
    #[error("bad magic in {0}")]
    BadMagic(PathBuf),

    /// A stored value was written by an unknown format version.
    #[error("unsupported store format version {version} in {path}")]
    UnsupportedVersion {
        /// File that was read.
        path: PathBuf,
        /// Version found.
        version: u32,
    },

    /// Stored checksum does not match the value.
    #[error("checksum mismatch in {0}")]
    ChecksumMismatch(PathBuf),

    /// Keys are restricted to `[a-z0-9_]`.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from administrator operations on the lifecycle engine.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// No record carries this name.
    #[error("no player named {0:?}")]
    UnknownName(String),

    /// The player has no revive to undo.
    #[error("player {0:?} has no revive to undo")]
    NothingToUndo(String),

    /// The player has never died.
    #[error("player {0:?} has no recorded death location")]
    NoDeathLocation(String),

    /// The host has no world with this name.
    #[error("world {0:?} is not available")]
    WorldUnavailable(String),

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The player store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
