//! Core data model shared by every subsystem: frontier entries, page
//! records, session metadata, and the verdicts the Scope Guard and
//! Admission filter produce. Field names mirror the JSON shapes required
//! by the cache's on-disk format so `serde_json` round-trips without any
//! renaming layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque session identifier: host + start timestamp + config digest,
/// joined so it is both unique and human-legible in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn new(host: &str, started_at: DateTime<Utc>, config_digest: &str) -> Self {
        Self(format!(
            "{}_{}_{}",
            sanitize_filename::sanitize(host),
            started_at.format("%Y%m%dT%H%M%SZ"),
            &config_digest[..config_digest.len().min(8)]
        ))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Immutable context established at crawl start: the seed URL, the scope
/// policy it implies, and the config digest the session was created
/// under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedContext {
    pub base_url: String,
    pub allowed_hosts: HashSet<String>,
    pub start_path: String,
    pub config_digest: String,
}

/// A not-yet-fetched (or being-fetched) admitted URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub referrer: Option<String>,
    pub priority: u32,
}

/// Outcome of a single fetch, consumed by the extractor and never
/// persisted as-is.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: u16,
    pub final_url: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub elapsed: std::time::Duration,
    pub was_rate_limited: bool,
    pub retries: u32,
    pub rate_limited_cooldown_set: bool,
}

/// An image referenced by a page, before or after the optional local
/// download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Page metadata (description, keywords, author) lifted from `<meta>`
/// tags during extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Content classification assigned in spec.md §4.4 step 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Documentation,
    Content,
    Navigation,
    Technical,
    LowQuality,
    Excluded,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Classification::Documentation => "documentation",
            Classification::Content => "content",
            Classification::Navigation => "navigation",
            Classification::Technical => "technical",
            Classification::LowQuality => "low-quality",
            Classification::Excluded => "excluded",
        };
        write!(f, "{s}")
    }
}

/// A single persisted record, produced by the extractor and immutable
/// once written to `pages/page_NNNNNN.json[.gz]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub final_url: String,
    pub title: String,
    /// Cleaned HTML of the selected main-content subtree.
    pub content: String,
    pub text_content: String,
    pub metadata: PageMetadata,
    pub images: Vec<ImageDescriptor>,
    pub links: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub word_count: usize,
    pub content_type: String,
    /// e.g. "low-quality", "parse-error".
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl PageRecord {
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// `SessionMetadata.status` state machine (spec.md §4.6): `active` →
/// `completed`/`failed`, `failed` → `active` on resume. `partial` is a
/// diagnostic view reported by `doctor()`, never persisted as a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Session-level metadata, mutated atomically on each page commit and
/// status transition. JSON field names match spec.md §6's required-keys
/// list for `session.json` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub base_url: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub pages_scraped: usize,
    pub config_hash: String,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    pub cache_size: u64,
    /// Updated on every `append_page`; backs `doctor()`'s
    /// `session_timeout_hours` staleness check. Not named in spec.md's
    /// required-keys list but needed to implement it.
    pub heartbeat: DateTime<Utc>,
    /// Set when status transitions to `failed`; e.g. "cancelled".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Decisions about one candidate URL from the preview/approval
/// collaborator, consumed by Admission to pre-seed its allow/deny lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewSession {
    pub preview_id: String,
    pub approved_urls: Vec<String>,
    pub excluded_urls: Vec<String>,
}

/// An ordered, contiguous slice of PageRecords materialized by the
/// assembler's chunker. Never persisted independently of the output
/// artifact it becomes.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub records: Vec<&'a PageRecord>,
    pub index: usize,
    pub total: usize,
}

/// Verdict returned by the Scope Guard for a single candidate URL
/// (spec.md §4.1). Blocked-technical wins over any allow; homepage-allowed
/// is admissible only when the candidate path is exactly `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeVerdict {
    InScope,
    OutOfScope,
    HomepageAllowed,
    ParentAllowed,
    SiblingAllowed,
    BlockedTechnical,
}

impl ScopeVerdict {
    #[must_use]
    pub fn is_admitted(self) -> bool {
        !matches!(self, ScopeVerdict::OutOfScope | ScopeVerdict::BlockedTechnical)
    }
}

/// Reason a candidate URL was rejected by Admission (spec.md §4.2's
/// decision order), surfaced for logging and property testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Limit,
    Depth,
    Duplicate,
    NotApproved,
    Excluded,
    Scope,
    Robots,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::Limit => "limit",
            RejectReason::Depth => "depth",
            RejectReason::Duplicate => "duplicate",
            RejectReason::NotApproved => "not-approved",
            RejectReason::Excluded => "excluded",
            RejectReason::Scope => "scope",
            RejectReason::Robots => "robots",
        };
        write!(f, "{s}")
    }
}

/// Outcome of running a FrontierEntry through Admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admit,
    Reject(RejectReason),
}
