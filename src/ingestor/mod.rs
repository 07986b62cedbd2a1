//! Playlist ingestion: parsing raw playlist text and validating its entries

pub mod m3u_parser;
pub mod validation;

pub use m3u_parser::{Candidate, M3uParser, ParserState};
pub use validation::{ChannelValidator, ValidatedBatch};
