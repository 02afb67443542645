//! Shared default values used across config, scheduling, and cache modules.
//!
//! Centralized here to avoid magic numbers scattered through the crawl
//! pipeline, matching the recognized configuration defaults of the
//! crawling / human_behavior / cache / chunking config sections.

/// Default maximum crawl depth from the seed URL.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Default hard cap on pages admitted in a single session.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Default base inter-request delay, in seconds, before fatigue/weekend
/// adjustment.
pub const DEFAULT_REQUEST_DELAY_SECS: f64 = 2.0;

/// Default `base_reading_time` window, in seconds.
pub const DEFAULT_READING_TIME_RANGE: (f64, f64) = (2.0, 8.0);

/// Default `navigation_decision` window, in seconds.
pub const DEFAULT_NAVIGATION_DECISION_RANGE: (f64, f64) = (1.0, 3.0);

/// Default jitter applied to the reading-time window, as a percentage.
pub const DEFAULT_VARIANCE_PERCENT: u8 = 20;

/// Pages fetched before a longer "session break" pause is injected.
pub const DEFAULT_SESSION_BREAK_AFTER: u32 = 50;

/// Multiplier applied to delays when the wall clock falls on a weekend.
pub const DEFAULT_WEEKEND_FACTOR: f64 = 1.3;

/// Number of pages a 429 cooldown doubles delays for.
pub const DEFAULT_COOLDOWN_PAGES: u32 = 10;

/// Retry policy defaults: base delay, backoff factor, cap, max attempts.
pub const RETRY_BASE_DELAY_SECS: f64 = 1.0;
pub const RETRY_FACTOR: f64 = 2.0;
pub const RETRY_CAP_SECS: f64 = 60.0;
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Redirect limit for the polite fetcher.
pub const MAX_REDIRECTS: usize = 10;

/// Minimum word count for a page to avoid the `low-quality` classification.
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 50;

/// Text-to-link density threshold below which an element is considered
/// navigation chrome.
pub const DEFAULT_MENU_DENSITY_THRESHOLD: f64 = 0.2;

/// Link count above which an element is considered navigation chrome.
pub const DEFAULT_MENU_LINK_COUNT_THRESHOLD: usize = 5;

/// Robots.txt cache TTL, in hours.
pub const ROBOTS_CACHE_TTL_HOURS: i64 = 24;

/// Default `session_timeout_hours` used by `doctor()` to flag a stale
/// `active` session.
pub const DEFAULT_SESSION_TIMEOUT_HOURS: i64 = 24;

/// Number of most-recent pages re-harvested for links on resume
/// (`K = min(count, 100)`).
pub const RESUME_REHARVEST_LIMIT: usize = 100;

/// Per-file compression threshold, in bytes, for offloading gzip to
/// `spawn_blocking` rather than compressing inline.
pub const DEFAULT_COMPRESSION_THRESHOLD_BYTES: usize = 1_048_576;

/// Default User-Agent header sent by the polite fetcher.
pub const DEFAULT_USER_AGENT: &str =
    "sitecache/0.1 (+https://github.com/; polite archival crawler)";

/// Markdown/PDF size-estimation overhead multipliers.
pub const DEFAULT_MARKDOWN_OVERHEAD: f64 = 1.2;
pub const DEFAULT_PDF_OVERHEAD: f64 = 2.5;
