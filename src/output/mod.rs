//! Persisted artifacts: writing a run's catalog and reading it back

pub mod reader;
pub mod writer;

pub use reader::{CatalogPage, CatalogReader, CatalogStats};
pub use writer::{ArtifactInfo, MultiFormatWriter, WriteReport};
