/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Fetch defaults
pub const DEFAULT_FETCH_TIMEOUT: &str = "10s";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

// Pipeline defaults
pub const DEFAULT_INTER_PROVIDER_DELAY: &str = "1s";
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 1;

// Output defaults
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "./data";
pub const DEFAULT_PLAYLIST_FILENAME: &str = "result.m3u";
pub const DEFAULT_PLAIN_LIST_FILENAME: &str = "result.txt";
pub const DEFAULT_SNAPSHOT_FILENAME: &str = "sources.json";
pub const DEFAULT_ATOMIC_PUBLISH: bool = true;

// Validation defaults
pub const DEFAULT_ALLOWED_SCHEMES: &[&str] = &["http://", "https://"];

// Scheduler defaults (sec min hour day-of-month month day-of-week)
pub const DEFAULT_SCHEDULE_CRON: &str = "0 0 */6 * * *";
pub const DEFAULT_RUN_ON_START: bool = true;

// Config file
pub const DEFAULT_CONFIG_FILE: &str = "live-catalog.toml";
pub const ENV_PREFIX: &str = "LIVE_CATALOG_";

/// Upstream providers in their tie-break order, each with its mirror list
pub const DEFAULT_PROVIDERS: &[(&str, &[&str])] = &[
    (
        "fanmingming",
        &[
            "https://raw.fastgit.org/fanmingming/live/main/tv/m3u/global.m3u",
            "https://raw.githubusercontent.com/fanmingming/live/main/tv/m3u/global.m3u",
            "https://cdn.jsdelivr.net/gh/fanmingming/live@main/tv/m3u/global.m3u",
        ],
    ),
    (
        "yousq",
        &[
            "https://raw.fastgit.org/yousq/iptv/main/iptv.m3u",
            "https://raw.githubusercontent.com/yousq/iptv/main/iptv.m3u",
        ],
    ),
];
