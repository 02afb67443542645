//! Admission (spec.md §4.2): decides whether a candidate FrontierEntry
//! advances into the frontier. First-match-wins over the decision order
//! spec.md lists; every rejection carries the reason it was rejected for,
//! used both for logging and for property testing (spec.md §8 property 3).

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashSet;

use crate::config::ArchiveConfig;
use crate::robots::RobotsCache;
use crate::scope::evaluate as scope_evaluate;
use crate::types::{AdmissionDecision, FrontierEntry, RejectReason, SeedContext};
use crate::utils::canonicalize;

/// Process-local admission state: the set of canonicalized URLs ever
/// admitted, reconstructed on resume from the cached session (spec.md
/// §3's `AdmissionState`).
pub struct AdmissionState {
    admitted: DashSet<String>,
    admitted_count: AtomicUsize,
}

impl AdmissionState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            admitted: DashSet::new(),
            admitted_count: AtomicUsize::new(0),
        }
    }

    /// Rebuild from a prior session's persisted PageRecord URLs (resume
    /// path, spec.md §4.5).
    #[must_use]
    pub fn from_urls(urls: impl IntoIterator<Item = String>) -> Self {
        let admitted = DashSet::new();
        for url in urls {
            admitted.insert(url);
        }
        let count = admitted.len();
        Self {
            admitted,
            admitted_count: AtomicUsize::new(count),
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.admitted_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn contains(&self, canonical_url: &str) -> bool {
        self.admitted.contains(canonical_url)
    }
}

impl Default for AdmissionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate spec.md §4.2's decision order for one candidate. On
/// admission, inserts the canonical URL into `state` so later duplicate
/// candidates are rejected.
pub async fn decide(
    candidate: &FrontierEntry,
    state: &AdmissionState,
    seed: &SeedContext,
    config: &ArchiveConfig,
    approved_urls: Option<&HashSet<String>>,
    robots: &RobotsCache,
) -> AdmissionDecision {
    let tracking_keys = config.tracking_query_keys();

    // 1. max_pages
    if state.count() >= config.crawling().max_pages {
        return AdmissionDecision::Reject(RejectReason::Limit);
    }

    // 2. max_depth
    if candidate.depth > config.crawling().max_depth {
        return AdmissionDecision::Reject(RejectReason::Depth);
    }

    let Some(canonical) = canonicalize(&candidate.url, tracking_keys) else {
        return AdmissionDecision::Reject(RejectReason::Excluded);
    };
    let canonical_str = canonical.to_string();

    // 3. duplicate
    if state.contains(&canonical_str) {
        return AdmissionDecision::Reject(RejectReason::Duplicate);
    }

    // 4. approved-URL set
    if let Some(approved) = approved_urls {
        if !approved.contains(&canonical_str) {
            return AdmissionDecision::Reject(RejectReason::NotApproved);
        }
    }

    // 5. exclude patterns
    if config
        .excluded_patterns_compiled()
        .iter()
        .any(|re| re.is_match(canonical.path()))
    {
        return AdmissionDecision::Reject(RejectReason::Excluded);
    }

    // 6. Scope Guard
    let verdict = scope_evaluate(seed, &candidate.url, config.path_scoping(), tracking_keys);
    if !verdict.is_admitted() {
        return AdmissionDecision::Reject(RejectReason::Scope);
    }

    // 7. robots.txt
    if config.crawling().respect_robots
        && !robots
            .is_allowed(&canonical_str, &config.crawling().user_agent)
            .await
    {
        return AdmissionDecision::Reject(RejectReason::Robots);
    }

    // 8. admit
    state.admitted.insert(canonical_str);
    state.admitted_count.fetch_add(1, Ordering::Relaxed);
    AdmissionDecision::Admit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;
    use std::collections::HashSet as StdHashSet;

    fn test_config() -> ArchiveConfig {
        ArchiveConfig::builder()
            .storage_dir("/tmp/sitecache-test")
            .start_url("https://docs.example.org/guide")
            .respect_robots(false)
            .max_pages(2)
            .max_depth(2)
            .build()
            .unwrap()
    }

    fn seed() -> SeedContext {
        let mut hosts = StdHashSet::new();
        hosts.insert("docs.example.org".to_string());
        SeedContext {
            base_url: "https://docs.example.org/guide".to_string(),
            allowed_hosts: hosts,
            start_path: "/guide".to_string(),
            config_digest: "abc".to_string(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicates() {
        let config = test_config();
        let seed = seed();
        let state = AdmissionState::new();
        let robots = RobotsCache::new(reqwest::Client::new());
        let entry = FrontierEntry {
            url: "https://docs.example.org/guide/intro".to_string(),
            depth: 1,
            referrer: None,
            priority: 0,
        };

        let first = decide(&entry, &state, &seed, &config, None, &robots).await;
        assert_eq!(first, AdmissionDecision::Admit);

        let second = decide(&entry, &state, &seed, &config, None, &robots).await;
        assert_eq!(second, AdmissionDecision::Reject(RejectReason::Duplicate));
    }

    #[tokio::test]
    async fn rejects_over_max_pages() {
        let config = test_config();
        let seed = seed();
        let state = AdmissionState::from_urls(vec![
            "https://docs.example.org/guide/a".to_string(),
            "https://docs.example.org/guide/b".to_string(),
        ]);
        let robots = RobotsCache::new(reqwest::Client::new());
        let entry = FrontierEntry {
            url: "https://docs.example.org/guide/c".to_string(),
            depth: 1,
            referrer: None,
            priority: 0,
        };

        let decision = decide(&entry, &state, &seed, &config, None, &robots).await;
        assert_eq!(decision, AdmissionDecision::Reject(RejectReason::Limit));
    }

    #[tokio::test]
    async fn rejects_over_max_depth() {
        let config = test_config();
        let seed = seed();
        let state = AdmissionState::new();
        let robots = RobotsCache::new(reqwest::Client::new());
        let entry = FrontierEntry {
            url: "https://docs.example.org/guide/deep".to_string(),
            depth: 5,
            referrer: None,
            priority: 0,
        };

        let decision = decide(&entry, &state, &seed, &config, None, &robots).await;
        assert_eq!(decision, AdmissionDecision::Reject(RejectReason::Depth));
    }
}
