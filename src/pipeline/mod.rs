//! The fetch → parse → validate → build → dedupe → write pipeline

pub mod builder;
pub mod dedup;
pub mod lock;
pub mod orchestrator;

pub use builder::CatalogBuilder;
pub use dedup::dedupe;
pub use lock::RunLock;
pub use orchestrator::{CatalogPipeline, ProviderReport, RunSummary};
