//! Shared helpers: HTTP fetching, decompression, URL handling, cron and
//! human-readable formatting

pub mod cron_helper;
pub mod decompression;
pub mod http_client;
pub mod human_format;
pub mod url;

pub use decompression::{CompressionFormat, DecompressionService};
pub use http_client::{HttpFetcher, StandardHttpClient};
pub use url::UrlUtils;
