//! Channel sources: remote playlist providers with mirror fallback, and the
//! static fallback list appended to every catalog

pub mod fallback;
pub mod m3u;
pub mod traits;

pub use fallback::StaticFallbackSource;
pub use m3u::M3uSourceAdapter;
pub use traits::{ChannelSource, ProviderFetch};
