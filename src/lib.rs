//! `sitecache`: a polite, resumable site archiver. Crawls a single site
//! within an owner-scoped boundary, caches pages incrementally as it
//! goes, and assembles the result into a PDF or Markdown artifact.
//!
//! The crate is organized around the four subsystems of the archive
//! engine: the crawl pipeline ([`admission`], [`scope`], [`crawl_engine`]),
//! the polite fetcher ([`fetch`], [`robots`]), the session cache
//! ([`cache`]), and the output assembler ([`assembler`]). [`orchestrator`]
//! is the only piece that drives all four together.

pub mod admission;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod crawl_engine;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod orchestrator;
pub mod preview;
pub mod robots;
pub mod scope;
pub mod types;
pub mod utils;

pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};
pub use orchestrator::{CancellationToken, Orchestrator, RunOutcome};
pub use types::SessionId;
