//! Fixed list of known-good broadcaster streams
//!
//! Appended after every remote provider so a run always produces a non-empty
//! catalog, even when every upstream is unreachable.

use crate::models::ChannelEntry;

const FALLBACK_CHANNELS: &[(&str, &str)] = &[
    ("CCTV-1 综合", "http://39.135.55.105:6610/PLTV/88888910/224/3221225618/index.m3u8"),
    ("CCTV-2 财经", "http://39.135.55.105:6610/PLTV/88888910/224/3221225619/index.m3u8"),
    ("CCTV-3 综艺", "http://39.135.55.105:6610/PLTV/88888910/224/3221225620/index.m3u8"),
    ("CCTV-4 国际", "http://39.135.55.105:6610/PLTV/88888910/224/3221225621/index.m3u8"),
    ("CCTV-5 体育", "http://39.135.55.105:6610/PLTV/88888910/224/3221225622/index.m3u8"),
    ("浙江卫视", "http://39.135.55.105:6610/PLTV/88888910/224/3221225814/index.m3u8"),
    ("江苏卫视", "http://39.135.55.105:6610/PLTV/88888910/224/3221225815/index.m3u8"),
    ("湖南卫视", "http://39.135.55.105:6610/PLTV/88888910/224/3221225816/index.m3u8"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFallbackSource;

impl StaticFallbackSource {
    pub fn entries() -> Vec<ChannelEntry> {
        FALLBACK_CHANNELS
            .iter()
            .map(|(name, url)| ChannelEntry::new_unchecked(name.to_string(), url.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::ChannelValidator;

    #[test]
    fn test_fallback_entries_pass_validation() {
        let validator = ChannelValidator::default();
        let entries = StaticFallbackSource::entries();
        assert_eq!(entries.len(), 8);

        for entry in &entries {
            let validated = validator.validate(entry.name(), entry.url()).unwrap();
            assert_eq!(&validated, entry);
        }
    }

    #[test]
    fn test_fallback_order() {
        let entries = StaticFallbackSource::entries();
        assert_eq!(entries[0].name(), "CCTV-1 综合");
        assert_eq!(entries[7].name(), "湖南卫视");
        assert!(entries[7].url().contains("/3221225816/"));
    }
}
