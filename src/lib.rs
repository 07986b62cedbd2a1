pub mod config;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod scheduler;
pub mod sources;
pub mod utils;

pub use config::Config;
pub use errors::{AppError, AppResult};
pub use models::{Catalog, CatalogSnapshot, ChannelEntry};
pub use pipeline::{CatalogPipeline, RunSummary};
