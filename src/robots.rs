//! robots.txt cache (spec.md §4.2): fetched lazily per host on first
//! admission attempt, cached with a 24-hour TTL. Fetch failures are
//! treated as permissive but logged, matching spec.md's explicit
//! fail-open policy.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use robotstxt::DefaultMatcher;

use crate::utils::ROBOTS_CACHE_TTL_HOURS;

struct CachedRobots {
    body: Option<String>,
    fetched_at: DateTime<Utc>,
}

/// Per-host robots.txt cache, owned by the Fetcher (spec.md §3's
/// ownership table assigns the robots cache to the Fetcher alongside the
/// rate-limit adaptation state).
pub struct RobotsCache {
    entries: DashMap<String, CachedRobots>,
    client: reqwest::Client,
}

impl RobotsCache {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            entries: DashMap::new(),
            client,
        }
    }

    /// `true` if `url` is allowed for `user_agent` under the cached (or
    /// freshly fetched) robots.txt for its host. Permissive on any fetch
    /// or parse failure.
    pub async fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return true;
        };
        let Some(host) = parsed.host_str() else {
            return true;
        };
        let host = host.to_string();

        let needs_fetch = match self.entries.get(&host) {
            Some(entry) => {
                Utc::now().signed_duration_since(entry.fetched_at).num_hours()
                    >= ROBOTS_CACHE_TTL_HOURS
            }
            None => true,
        };

        if needs_fetch {
            let body = self.fetch_robots_txt(&parsed).await;
            self.entries.insert(
                host.clone(),
                CachedRobots {
                    body,
                    fetched_at: Utc::now(),
                },
            );
        }

        match self.entries.get(&host) {
            Some(entry) => match &entry.body {
                Some(body) => {
                    let mut matcher = DefaultMatcher::default();
                    matcher.one_agent_allowed_by_robots(body, user_agent, url)
                }
                None => true,
            },
            None => true,
        }
    }

    async fn fetch_robots_txt(&self, url: &url::Url) -> Option<String> {
        let robots_url = format!(
            "{}://{}/robots.txt",
            url.scheme(),
            url.host_str().unwrap_or_default()
        );
        match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => resp.text().await.ok(),
            Ok(resp) => {
                tracing::debug!(url = %robots_url, status = %resp.status(), "robots.txt not available");
                None
            }
            Err(err) => {
                tracing::warn!(url = %robots_url, error = %err, "robots.txt fetch failed, treating as permissive");
                None
            }
        }
    }
}
