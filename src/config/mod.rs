//! Configuration for the archive engine: a `serde`-serializable,
//! format-agnostic `ArchiveConfig` built through a compile-time-checked
//! typestate builder.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::{ArchiveConfigBuilder, WithStartUrl, WithStorageDir};
pub use types::{
    AllowNavigation, ArchiveConfig, CacheConfig, ChunkingConfig, CleanupSettings, ContentConfig,
    CrawlingConfig, HumanBehaviorConfig, MarkdownConfig, PageOrientation, PathScopingConfig,
    PdfConfig, SizeEstimation,
};
