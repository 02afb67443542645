//! Accessor methods for `ArchiveConfig`.

use std::path::PathBuf;

use super::types::{
    ArchiveConfig, CacheConfig, ChunkingConfig, ContentConfig, CrawlingConfig,
    HumanBehaviorConfig, MarkdownConfig, PathScopingConfig, PdfConfig,
};

impl ArchiveConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn allowed_domains(&self) -> Option<&Vec<String>> {
        self.allowed_domains.as_ref()
    }

    #[must_use]
    pub fn excluded_patterns(&self) -> Option<&Vec<String>> {
        self.excluded_patterns.as_ref()
    }

    /// Pre-compiled excluded patterns, compiled once at build time to
    /// avoid regex compilation in Admission's hot path.
    #[must_use]
    pub fn excluded_patterns_compiled(&self) -> &[regex::Regex] {
        &self.excluded_patterns_compiled
    }

    #[must_use]
    pub fn tracking_query_keys(&self) -> &[String] {
        &self.tracking_query_keys
    }

    #[must_use]
    pub fn crawling(&self) -> &CrawlingConfig {
        &self.crawling
    }

    #[must_use]
    pub fn path_scoping(&self) -> &PathScopingConfig {
        &self.path_scoping
    }

    #[must_use]
    pub fn content(&self) -> &ContentConfig {
        &self.content
    }

    #[must_use]
    pub fn human_behavior(&self) -> &HumanBehaviorConfig {
        &self.human_behavior
    }

    #[must_use]
    pub fn pdf(&self) -> &PdfConfig {
        &self.pdf
    }

    #[must_use]
    pub fn markdown(&self) -> &MarkdownConfig {
        &self.markdown
    }

    #[must_use]
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    #[must_use]
    pub fn chunking(&self) -> &ChunkingConfig {
        &self.chunking
    }

    /// Stable digest of the config values that affect scope/admission
    /// decisions, used as part of `SessionId` and `config_hash`.
    #[must_use]
    pub fn digest(&self) -> String {
        let summary = format!(
            "{}|{:?}|{:?}|{}|{:?}|{:?}",
            self.start_url,
            self.allowed_domains,
            self.excluded_patterns,
            self.crawling.max_depth,
            self.crawling.max_pages,
            self.path_scoping.enabled,
        );
        let hash = xxhash_rust::xxh3::xxh3_64(summary.as_bytes());
        format!("{hash:016x}")
    }
}
