//! Type-safe builder for `ArchiveConfig` using the typestate pattern.
//!
//! Required fields (`storage_dir`, `start_url`) are enforced at compile
//! time; every section has a sensible default and can be overridden
//! wholesale or (for the most commonly tuned fields) individually.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{
    ArchiveConfig, CacheConfig, ChunkingConfig, ContentConfig, CrawlingConfig,
    HumanBehaviorConfig, MarkdownConfig, PathScopingConfig, PdfConfig,
};

/// Convert a glob pattern (`*` matches any sequence) into a compiled,
/// fully-anchored regex. Compiled once at config build time so the
/// exclude-pattern check in Admission never compiles on the hot path.
fn compile_glob_pattern(pattern: &str) -> Result<Regex> {
    let regex_pattern = pattern.replace('*', ".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored).map_err(|e| anyhow!("invalid glob pattern '{pattern}': {e}"))
}

pub struct WithStorageDir;
pub struct WithStartUrl;

pub struct ArchiveConfigBuilder<State = ()> {
    storage_dir: Option<PathBuf>,
    start_url: Option<String>,
    allowed_domains: Option<Vec<String>>,
    excluded_patterns: Option<Vec<String>>,
    tracking_query_keys: Vec<String>,
    crawling: CrawlingConfig,
    path_scoping: PathScopingConfig,
    content: ContentConfig,
    human_behavior: HumanBehaviorConfig,
    pdf: PdfConfig,
    markdown: MarkdownConfig,
    cache: CacheConfig,
    chunking: ChunkingConfig,
    _phantom: PhantomData<State>,
}

impl Default for ArchiveConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            start_url: None,
            allowed_domains: None,
            excluded_patterns: None,
            tracking_query_keys: default_tracking_keys(),
            crawling: CrawlingConfig::default(),
            path_scoping: PathScopingConfig::default(),
            content: ContentConfig::default(),
            human_behavior: HumanBehaviorConfig::default(),
            pdf: PdfConfig::default(),
            markdown: MarkdownConfig::default(),
            cache: CacheConfig::default(),
            chunking: ChunkingConfig::default(),
            _phantom: PhantomData,
        }
    }
}

fn default_tracking_keys() -> Vec<String> {
    ["utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content", "fbclid", "gclid"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl ArchiveConfig {
    #[must_use]
    pub fn builder() -> ArchiveConfigBuilder<()> {
        ArchiveConfigBuilder::default()
    }
}

impl ArchiveConfigBuilder<()> {
    #[must_use]
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> ArchiveConfigBuilder<WithStorageDir> {
        ArchiveConfigBuilder {
            storage_dir: Some(dir.into()),
            start_url: self.start_url,
            allowed_domains: self.allowed_domains,
            excluded_patterns: self.excluded_patterns,
            tracking_query_keys: self.tracking_query_keys,
            crawling: self.crawling,
            path_scoping: self.path_scoping,
            content: self.content,
            human_behavior: self.human_behavior,
            pdf: self.pdf,
            markdown: self.markdown,
            cache: self.cache,
            chunking: self.chunking,
            _phantom: PhantomData,
        }
    }
}

impl ArchiveConfigBuilder<WithStorageDir> {
    #[must_use]
    pub fn start_url(self, url: impl Into<String>) -> ArchiveConfigBuilder<WithStartUrl> {
        let url_string = url.into();
        let normalized = if url_string.starts_with("http://") || url_string.starts_with("https://")
        {
            url_string
        } else {
            format!("https://{url_string}")
        };

        ArchiveConfigBuilder {
            storage_dir: self.storage_dir,
            start_url: Some(normalized),
            allowed_domains: self.allowed_domains,
            excluded_patterns: self.excluded_patterns,
            tracking_query_keys: self.tracking_query_keys,
            crawling: self.crawling,
            path_scoping: self.path_scoping,
            content: self.content,
            human_behavior: self.human_behavior,
            pdf: self.pdf,
            markdown: self.markdown,
            cache: self.cache,
            chunking: self.chunking,
            _phantom: PhantomData,
        }
    }
}

impl ArchiveConfigBuilder<WithStartUrl> {
    pub fn build(self) -> Result<ArchiveConfig> {
        let excluded_patterns_compiled = if let Some(ref patterns) = self.excluded_patterns {
            patterns
                .iter()
                .map(|p| compile_glob_pattern(p))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        let storage_dir = self
            .storage_dir
            .ok_or_else(|| anyhow!("storage_dir is required"))?;
        let storage_dir = if storage_dir.is_absolute() {
            storage_dir
        } else {
            std::env::current_dir()?.join(storage_dir)
        };

        Ok(ArchiveConfig {
            storage_dir,
            start_url: self
                .start_url
                .ok_or_else(|| anyhow!("start_url is required"))?,
            allowed_domains: self.allowed_domains,
            excluded_patterns: self.excluded_patterns,
            excluded_patterns_compiled,
            tracking_query_keys: self.tracking_query_keys,
            crawling: self.crawling,
            path_scoping: self.path_scoping,
            content: self.content,
            human_behavior: self.human_behavior,
            pdf: self.pdf,
            markdown: self.markdown,
            cache: self.cache,
            chunking: self.chunking,
        })
    }
}

/// Section replacement and common single-field setters, available
/// regardless of typestate (all have defaults).
impl<State> ArchiveConfigBuilder<State> {
    #[must_use]
    pub fn crawling(mut self, crawling: CrawlingConfig) -> Self {
        self.crawling = crawling;
        self
    }

    #[must_use]
    pub fn path_scoping(mut self, path_scoping: PathScopingConfig) -> Self {
        self.path_scoping = path_scoping;
        self
    }

    #[must_use]
    pub fn content(mut self, content: ContentConfig) -> Self {
        self.content = content;
        self
    }

    #[must_use]
    pub fn human_behavior(mut self, human_behavior: HumanBehaviorConfig) -> Self {
        self.human_behavior = human_behavior;
        self
    }

    #[must_use]
    pub fn pdf(mut self, pdf: PdfConfig) -> Self {
        self.pdf = pdf;
        self
    }

    #[must_use]
    pub fn markdown(mut self, markdown: MarkdownConfig) -> Self {
        self.markdown = markdown;
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.crawling.max_depth = depth;
        self
    }

    #[must_use]
    pub fn max_pages(mut self, pages: usize) -> Self {
        self.crawling.max_pages = pages;
        self
    }

    #[must_use]
    pub fn respect_robots(mut self, respect: bool) -> Self {
        self.crawling.respect_robots = respect;
        self
    }

    #[must_use]
    pub fn allowed_domains(mut self, domains: Option<Vec<String>>) -> Self {
        self.allowed_domains = domains;
        self
    }

    #[must_use]
    pub fn excluded_patterns(mut self, patterns: Option<Vec<String>>) -> Self {
        self.excluded_patterns = patterns;
        self
    }

    #[must_use]
    pub fn tracking_query_keys(mut self, keys: Vec<String>) -> Self {
        self.tracking_query_keys = keys;
        self
    }
}
