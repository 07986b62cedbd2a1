//! Channel normalization and validation
//!
//! Turns parser candidates into `ChannelEntry` values. Rejected candidates are
//! logged and counted; validation never fails a fetch or a run.

use tracing::debug;

use crate::config::ValidationConfig;
use crate::config::defaults::DEFAULT_ALLOWED_SCHEMES;
use crate::errors::RejectReason;
use crate::ingestor::m3u_parser::Candidate;
use crate::models::ChannelEntry;

#[derive(Debug, Clone)]
pub struct ChannelValidator {
    allowed_schemes: Vec<String>,
}

/// Entries accepted from one batch of candidates, plus the number dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub entries: Vec<ChannelEntry>,
    pub rejected: usize,
}

impl Default for ChannelValidator {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_SCHEMES.iter().map(|s| s.to_string()).collect())
    }
}

impl ChannelValidator {
    pub fn new(allowed_schemes: Vec<String>) -> Self {
        Self { allowed_schemes }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.allowed_schemes.clone())
    }

    /// Trim both fields and check the entry invariants
    pub fn validate(&self, name: &str, url: &str) -> Result<ChannelEntry, RejectReason> {
        let name = name.trim();
        let url = url.trim();

        if name.is_empty() {
            return Err(RejectReason::EmptyName);
        }
        if url.is_empty() {
            return Err(RejectReason::EmptyUrl);
        }
        if !self
            .allowed_schemes
            .iter()
            .any(|scheme| url.starts_with(scheme.as_str()))
        {
            return Err(RejectReason::DisallowedScheme {
                url: url.to_string(),
            });
        }

        Ok(ChannelEntry::new_unchecked(name.to_string(), url.to_string()))
    }

    /// Validate a candidate sequence in order, keeping the accepted entries
    pub fn validate_all<I>(&self, candidates: I, origin: &str) -> ValidatedBatch
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut batch = ValidatedBatch::default();

        for candidate in candidates {
            match self.validate(&candidate.name, &candidate.url) {
                Ok(entry) => batch.entries.push(entry),
                Err(reason) => {
                    batch.rejected += 1;
                    debug!(
                        "Rejected entry from {}: name='{}' ({})",
                        origin, candidate.name, reason
                    );
                }
            }
        }

        batch
    }
}
