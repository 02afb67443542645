//! Core configuration types for the archive engine.
//!
//! `ArchiveConfig` groups its fields into the sections spec.md §6 names
//! (`crawling`, `path_scoping`, `content`, `human_behavior`, `pdf`,
//! `markdown`, `cache`, `chunking`) rather than the flat field list the
//! teacher crate used — this is a closer fit to the external-interface
//! table and is recorded as a deliberate deviation in DESIGN.md.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How aggressively admission follows links out of the main-content area
/// versus stripped menu/nav areas (spec.md §6's `allow_navigation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowNavigation {
    None,
    Limited,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlingConfig {
    pub max_depth: u32,
    pub max_pages: usize,
    pub request_delay: f64,
    pub respect_robots: bool,
    pub user_agent: String,
}

impl Default for CrawlingConfig {
    fn default() -> Self {
        Self {
            max_depth: crate::utils::DEFAULT_MAX_DEPTH,
            max_pages: crate::utils::DEFAULT_MAX_PAGES,
            request_delay: crate::utils::DEFAULT_REQUEST_DELAY_SECS,
            respect_robots: true,
            user_agent: crate::utils::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathScopingConfig {
    pub enabled: bool,
    pub allow_parent_levels: u32,
    pub allow_homepage: bool,
    pub allow_siblings: bool,
    pub allow_navigation: AllowNavigation,
}

impl Default for PathScopingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_parent_levels: 0,
            allow_homepage: true,
            allow_siblings: false,
            allow_navigation: AllowNavigation::Limited,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    pub include_menus: bool,
    pub include_images: bool,
    pub remove_images: bool,
    pub min_content_length: usize,
    pub include_metadata: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            include_menus: false,
            include_images: true,
            remove_images: false,
            min_content_length: crate::utils::DEFAULT_MIN_CONTENT_LENGTH,
            include_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanBehaviorConfig {
    pub base_reading_time: (f64, f64),
    pub navigation_decision: (f64, f64),
    pub variance_percent: u8,
    pub session_break_after: u32,
    pub weekend_factor: f64,
}

impl Default for HumanBehaviorConfig {
    fn default() -> Self {
        Self {
            base_reading_time: crate::utils::DEFAULT_READING_TIME_RANGE,
            navigation_decision: crate::utils::DEFAULT_NAVIGATION_DECISION_RANGE,
            variance_percent: crate::utils::DEFAULT_VARIANCE_PERCENT,
            session_break_after: crate::utils::DEFAULT_SESSION_BREAK_AFTER,
            weekend_factor: crate::utils::DEFAULT_WEEKEND_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    pub output_filename: String,
    pub page_size: String,
    pub orientation: PageOrientation,
    pub include_toc: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            output_filename: "output.pdf".to_string(),
            page_size: "A4".to_string(),
            orientation: PageOrientation::Portrait,
            include_toc: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    pub output_filename: String,
    pub multi_file: bool,
    pub include_toc: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            output_filename: "output.md".to_string(),
            multi_file: false,
            include_toc: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSettings {
    pub max_age_days: u32,
    pub keep_completed: bool,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            keep_completed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub compression: bool,
    pub compression_level: u8,
    pub max_sessions: usize,
    pub auto_cleanup: bool,
    pub cleanup_settings: CleanupSettings,
    pub save_frequency: usize,
    pub session_timeout_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("./cache"),
            compression: false,
            compression_level: 6,
            max_sessions: 100,
            auto_cleanup: false,
            cleanup_settings: CleanupSettings::default(),
            save_frequency: 1,
            session_timeout_hours: crate::utils::DEFAULT_SESSION_TIMEOUT_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeEstimation {
    pub markdown_overhead: f64,
    pub pdf_overhead: f64,
}

impl Default for SizeEstimation {
    fn default() -> Self {
        Self {
            markdown_overhead: crate::utils::DEFAULT_MARKDOWN_OVERHEAD,
            pdf_overhead: crate::utils::DEFAULT_PDF_OVERHEAD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Human-readable size like `"10MB"`; parsed by `chunker::parse_size`.
    pub default_max_size: Option<String>,
    /// Fixed record count per chunk; mutually compatible with
    /// `default_max_size` but size-based wins when both are set
    /// (spec.md §4.6).
    pub page_based_size: Option<usize>,
    pub size_estimation: SizeEstimation,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            default_max_size: None,
            page_based_size: None,
            size_estimation: SizeEstimation::default(),
        }
    }
}

/// Top-level configuration value the core consumes. Format-agnostic: the
/// host CLI owns TOML/YAML/JSON loading and produces this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// **INVARIANT:** always an absolute path (normalized in the builder).
    pub(crate) storage_dir: PathBuf,
    pub(crate) start_url: String,

    pub(crate) allowed_domains: Option<Vec<String>>,
    pub(crate) excluded_patterns: Option<Vec<String>>,
    #[serde(skip)]
    pub(crate) excluded_patterns_compiled: Vec<regex::Regex>,
    pub(crate) tracking_query_keys: Vec<String>,

    pub(crate) crawling: CrawlingConfig,
    pub(crate) path_scoping: PathScopingConfig,
    pub(crate) content: ContentConfig,
    pub(crate) human_behavior: HumanBehaviorConfig,
    pub(crate) pdf: PdfConfig,
    pub(crate) markdown: MarkdownConfig,
    pub(crate) cache: CacheConfig,
    pub(crate) chunking: ChunkingConfig,
}
