//! Typed error hierarchy for the archive engine.
//!
//! Each subsystem gets its own `thiserror` enum; `ArchiveError` composes
//! them via `#[from]` so the orchestrator can propagate any subsystem's
//! failure with `?` while still matching on `kind()` where behavior
//! differs (retryable vs. fatal vs. silently-counted).

use std::path::PathBuf;
use thiserror::Error;

/// Transport-level failures from the polite fetcher.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("TLS error: {0}")]
    Tls(String),
}

/// Non-2xx HTTP responses. Only 408/429/5xx are retryable; see
/// `FetchError::is_retryable`.
#[derive(Debug, Error)]
#[error("HTTP {status}")]
pub struct HttpError {
    pub status: u16,
}

/// robots.txt permanently denies a URL for the configured user-agent.
#[derive(Debug, Error)]
#[error("robots.txt disallows {url}")]
pub struct RobotsDenied {
    pub url: String,
}

/// Scope Guard rejection. Never logged above debug: this is expected,
/// high-volume traffic for any real crawl.
#[derive(Debug, Error)]
#[error("{url} rejected by scope guard: {reason}")]
pub struct ScopeRejected {
    pub url: String,
    pub reason: String,
}

/// Extractor failure. Never fatal — the orchestrator persists a stub
/// PageRecord with a `parse-error` flag and continues.
#[derive(Debug, Error)]
#[error("failed to parse content at {url}: {source}")]
pub struct ParseError {
    pub url: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Disk I/O failure in the session cache. Fatal to the session.
#[derive(Debug, Error)]
pub enum CacheIoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize record for session {session_id}: {source}")]
    Serialize {
        session_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to deserialize {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("session {0} not found")]
    SessionNotFound(String),
}

/// Output-generator sub-failure on a single section. Degrades per the
/// assembler's three-level fallback chain rather than aborting the run.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no PDF renderer is configured")]
    Unavailable,
    #[error("renderer failed for section {index}: {message}")]
    SectionFailed { index: usize, message: String },
    #[error("markdown conversion failed: {0}")]
    MarkdownConversion(String),
}

/// Fetch-layer error, covering both transport failures and HTTP status
/// outcomes, with enough information for the retry policy to decide.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Robots(#[from] RobotsDenied),
    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Per spec.md §4.3: 408/429/5xx and connection errors are retryable;
    /// other 4xx and robots denials are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http(HttpError { status }) => {
                *status == 408 || *status == 429 || *status >= 500
            }
            FetchError::Robots(_) | FetchError::Cancelled => false,
        }
    }

    /// True for a 429 response specifically, which additionally triggers
    /// the host-level cooldown flag.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Http(HttpError { status: 429 }))
    }
}

/// Top-level error returned by orchestrator-facing entry points.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Robots(#[from] RobotsDenied),
    #[error(transparent)]
    Scope(#[from] ScopeRejected),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    CacheIo(#[from] CacheIoError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("crawl cancelled")]
    Cancelled,
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
