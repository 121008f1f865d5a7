//! Error types for vnpatch.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for translation backend calls.
///
/// These never escape the translator: a failed call falls back to the
/// original text.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP request to the backend failed
    #[error("Backend request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("Backend error: {0}")]
    ApiError(String),

    /// Failed to parse backend response
    #[error("Failed to parse backend response: {0}")]
    ParseError(String),

    /// Backend answered with nothing usable
    #[error("Empty translation returned")]
    EmptyResponse,

    /// Text rejected before sending
    #[error("Text too long to translate ({length} > {limit} characters)")]
    TooLong { length: usize, limit: usize },

    /// Backend did not answer in time
    #[error("Backend timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Invalid backend configuration
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),
}

/// Error type for persisting the translation cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to write the cache file
    #[error("Failed to write translation cache: {0}")]
    WriteError(#[from] std::io::Error),

    /// Failed to serialize cache entries
    #[error("Failed to serialize translation cache: {0}")]
    SerializeError(#[from] serde_json::Error),
}

/// Error type for reinserting markup tokens into translated text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The translation changed the number of placeholders
    #[error("Placeholder count mismatch: expected {expected}, found {found}")]
    PlaceholderMismatch { expected: usize, found: usize },
}

/// Error type for a single file job.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Destination directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Source file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Destination file could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Verbatim copy failed
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// The blocking copy task panicked or was cancelled
    #[error("Copy task aborted: {0}")]
    TaskAborted(String),
}

/// Error type for job enumeration and dispatch.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input root could not be listed at all
    #[error("Cannot read input directory {path}: {message}")]
    InputUnreadable { path: PathBuf, message: String },

    /// A discovered file is not under the input root
    #[error("Path {0} is outside the input directory")]
    OutsideRoot(PathBuf),
}

/// Error type for the external packaging step.
#[derive(Error, Debug)]
pub enum PackagingError {
    /// Interpreter not found on PATH
    #[error("Interpreter '{name}' not found: {source}")]
    InterpreterNotFound { name: String, source: which::Error },

    /// Packager could not be started
    #[error("Failed to start packager: {0}")]
    SpawnError(#[from] std::io::Error),

    /// Packager exited unsuccessfully
    #[error("Packager exited with {0}")]
    Failed(std::process::ExitStatus),
}
