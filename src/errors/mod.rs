//! Centralized error handling for the live catalog crawler
//!
//! Every layer of the pipeline has its own error type. Only writer failures and
//! unexpected failures ever reach the top of a run; source and entry level
//! failures are absorbed where they happen.
//!
//! # Error Categories
//!
//! - **Source Errors**: mirror fetch failures (timeouts, HTTP status, transport)
//! - **Reject Reasons**: malformed playlist entries dropped during validation
//! - **Writer Errors**: failures persisting the output artifacts
//! - **Reader Errors**: failures loading persisted artifacts back
//!
//! # Usage
//!
//! ```rust
//! use live_catalog::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("no providers configured"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Writer Results
pub type WriterResult<T> = Result<T, WriterError>;

/// Convenience type alias for Reader Results
pub type ReaderResult<T> = Result<T, ReaderError>;
