//! The Polite Fetcher (spec.md §4.3): transport, delay discipline, and
//! retry/back-off, built around an injectable [`FetchCapability`] so
//! authenticated fetch and browser-based fetch adapters stay external
//! collaborators (spec.md §1).

pub mod reqwest_fetcher;
pub mod retry;
pub mod scheduler;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

pub use reqwest_fetcher::ReqwestFetcher;
pub use scheduler::{FatigueState, Scheduler};

/// Raw bytes-on-the-wire response, before content-type-driven decoding.
/// Mirrors spec.md §6's `fetch(url, timeout) → (status, final_url,
/// headers, body)`.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub final_url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Injected fetch capability. The default implementation
/// ([`ReqwestFetcher`]) is a plain HTTP client; an authenticated adapter
/// may wrap it by pre-attaching cookies, entirely outside this crate.
#[async_trait]
pub trait FetchCapability: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawResponse, FetchError>;
}
