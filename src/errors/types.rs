//! Error type definitions for the live catalog crawler
//!
//! This module defines all error types used throughout the crate, providing
//! a hierarchical error system where each pipeline layer reports its own
//! failures and `AppError` aggregates the ones that end a run.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type
///
/// Represents the failures that surface as a failed run. Provider-level and
/// entry-level problems never end up here.
#[derive(Error, Debug)]
pub enum AppError {
    /// Artifact persistence errors
    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    /// Artifact loading errors
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Operation already in progress errors
    #[error("Operation already in progress: {operation_type} on {resource}")]
    OperationInProgress {
        operation_type: String,
        resource: String,
    },

    /// Filesystem errors outside of artifact writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Mirror and provider fetch errors
///
/// All of these are transient from the pipeline's point of view: a failing
/// mirror falls through to the next one, and a provider whose mirrors are all
/// exhausted is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Request exceeded the per-attempt timeout
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Mirror answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Connection, DNS or TLS failure
    #[error("Transport error: {url} - {message}")]
    Transport { url: String, message: String },

    /// Mirror answered with an empty body
    #[error("Empty response body: {url}")]
    EmptyBody { url: String },

    /// Body could not be decoded (decompression failure)
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Body parsed but contained no valid channel entries
    #[error("No valid channel entries at {url} ({rejected} rejected)")]
    NoValidEntries { url: String, rejected: usize },

    /// Every configured mirror failed for a provider
    #[error("All {attempts} mirrors failed for provider '{provider}': {last_error}")]
    AllMirrorsFailed {
        provider: String,
        attempts: usize,
        last_error: String,
    },
}

/// Reasons a parsed playlist candidate is dropped during validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("channel name is empty")]
    EmptyName,

    #[error("channel url is empty")]
    EmptyUrl,

    #[error("url scheme not allowed: {url}")]
    DisallowedScheme { url: String },
}

/// Artifact persistence errors
#[derive(Error, Debug)]
pub enum WriterError {
    /// Output directory could not be created
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A staged artifact could not be moved into place
    #[error("Failed to publish {} -> {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot serialization failed
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A write failed after other artifacts of the same run were already
    /// written in place; those artifacts are left as they are
    #[error("Write failed after {} artifact(s) were already written: {source}", written.len())]
    PartialWrite {
        written: Vec<PathBuf>,
        #[source]
        source: Box<WriterError>,
    },
}

/// Artifact loading errors
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The expected artifact does not exist yet
    #[error("Artifact not available: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A persisted channel does not pass validation
    #[error("Invalid channel #{index} in {}: {reason}", path.display())]
    InvalidEntry {
        path: PathBuf,
        index: usize,
        reason: RejectReason,
    },

    /// Search keyword was empty after trimming
    #[error("Search keyword must not be empty")]
    EmptyQuery,
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an operation in progress error
    pub fn operation_in_progress<O: Into<String>, R: Into<String>>(
        operation_type: O,
        resource: R,
    ) -> Self {
        Self::OperationInProgress {
            operation_type: operation_type.into(),
            resource: resource.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl WriterError {
    /// Paths that were already written in place when the error occurred
    pub fn written_paths(&self) -> &[PathBuf] {
        match self {
            Self::PartialWrite { written, .. } => written,
            _ => &[],
        }
    }
}
