//! Crawl Orchestrator (spec.md §3, §5): the sole driver of the pipeline.
//! It pulls from the Frontier, runs candidates through Admission, calls
//! the Fetcher, hands the FetchOutcome to the Extractor, and is the only
//! task that ever touches a session's [`SessionWriter`] — the ownership
//! discipline §4.5's cache relies on instead of file locks.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tokio::sync::Notify;

use crate::admission::{self, AdmissionState};
use crate::cache::SessionWriter;
use crate::config::ArchiveConfig;
use crate::crawl_engine::{extract_domain, CircuitBreaker, DomainLimiter, Frontier};
use crate::error::{ArchiveError, CacheIoError, FetchError};
use crate::extractor;
use crate::fetch::{retry, FatigueState, FetchCapability, RawResponse, ReqwestFetcher, Scheduler};
use crate::robots::RobotsCache;
use crate::types::{FetchOutcome, FrontierEntry, PageRecord, SeedContext, SessionId};
use crate::utils::canonicalize;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Circuit-breaker thresholds (not configurable per spec.md §6's
/// recognized options, unlike the scheduler and retry knobs).
const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
const CIRCUIT_SUCCESS_THRESHOLD: u32 = 2;
const CIRCUIT_HALF_OPEN_TIMEOUT: Duration = Duration::from_secs(120);

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("static heading selector"));

/// Cooperative cancellation signal (spec.md §5): a flag plus a
/// [`Notify`] so the scheduler's own sleeps can be raced against it and
/// return immediately rather than waiting out the full delay.
#[derive(Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled; otherwise waits for
    /// `cancel()`. Race against a sleep with `tokio::select!` to get an
    /// interruptible delay.
    async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleep for `duration`, returning early (with `true`) if `cancel` fires
/// first.
async fn interruptible_sleep(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        () = tokio::time::sleep(duration) => false,
        () = cancel.cancelled() => true,
    }
}

/// Result of a completed crawl, cancelled or not.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub session_id: SessionId,
    pub pages_scraped: usize,
    pub cancelled: bool,
}

/// A lightweight, pre-fetch priority estimate from a URL's path alone
/// (spec.md §3: FrontierEntry.priority "derived from classification").
/// The real classifier in [`crate::extractor::classify`] needs the
/// fetched HTML, which isn't available yet for a not-yet-visited link;
/// this mirrors its path-pattern tier without re-exporting its private
/// regex tables.
fn heuristic_priority(url: &str) -> u32 {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default();

    if path.contains("/changelog") || path.contains("/release-notes") || path.contains("/api-reference") {
        20
    } else if path.contains("/docs") || path.contains("/guide") || path.contains("/reference") || path.contains("/manual") {
        30
    } else if path.contains("/tag") || path.contains("/categor") || path.contains("/archive") || path.contains("/search") {
        0
    } else {
        10
    }
}

fn count_headings(html: &str) -> usize {
    Html::parse_document(html).select(&HEADING_SELECTOR).count()
}

fn content_type_of(raw: &RawResponse) -> String {
    raw.headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Drives one crawl session end to end. Built once per crawl; `run` and
/// `resume` are the two entry points, both funneling into the shared
/// `drive` loop.
pub struct Orchestrator {
    config: Arc<ArchiveConfig>,
    fetcher: Arc<dyn FetchCapability>,
    domain_limiter: DomainLimiter,
    circuit_breaker: CircuitBreaker,
    robots: RobotsCache,
}

impl Orchestrator {
    pub fn new(config: Arc<ArchiveConfig>) -> Result<Self, ArchiveError> {
        let reqwest_fetcher = ReqwestFetcher::new(&config.crawling().user_agent)?;
        let robots = RobotsCache::new(reqwest_fetcher.client().clone());
        let fetcher: Arc<dyn FetchCapability> = Arc::new(reqwest_fetcher);

        Ok(Self {
            config,
            fetcher,
            // Spec.md §5: one HTTP request at a time per host.
            domain_limiter: DomainLimiter::new(1),
            circuit_breaker: CircuitBreaker::new(
                CIRCUIT_FAILURE_THRESHOLD,
                CIRCUIT_SUCCESS_THRESHOLD,
                CIRCUIT_HALF_OPEN_TIMEOUT,
            ),
            robots,
        })
    }

    /// Start a fresh crawl: creates a new session and seeds the frontier
    /// with the configured start URL at depth 0.
    pub async fn run(
        &self,
        approved_urls: Option<HashSet<String>>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ArchiveError> {
        let seed = self.build_seed()?;
        let mut writer = SessionWriter::create(self.config.cache().directory.as_path(), &seed, &self.config.digest())?;
        writer.set_compression(self.config.cache().compression, self.config.cache().compression_level);

        let admission_state = AdmissionState::new();
        let mut frontier = Frontier::new();
        frontier.push(FrontierEntry {
            url: seed.base_url.clone(),
            depth: 0,
            referrer: None,
            priority: heuristic_priority(&seed.base_url),
        });

        self.drive(writer, admission_state, frontier, seed, approved_urls, cancel).await
    }

    /// Resume a prior session (spec.md §4.5): reopen its `SessionWriter`,
    /// rebuild the admitted set from persisted PageRecord URLs, and
    /// re-derive the frontier by re-harvesting links from the most
    /// recent `min(count, 100)` pages. The fetcher's fatigue/cooldown
    /// state always starts fresh, since it is process-local and was
    /// never persisted.
    pub async fn resume(
        &self,
        session_id: SessionId,
        approved_urls: Option<HashSet<String>>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ArchiveError> {
        let (mut writer, pages) = SessionWriter::reopen(self.config.cache().directory.as_path(), session_id)?;
        writer.set_compression(self.config.cache().compression, self.config.cache().compression_level);

        let seed = self.build_seed()?;
        let tracking_keys = self.config.tracking_query_keys();

        let admitted: HashSet<String> = pages
            .iter()
            .filter_map(|p| canonicalize(&p.url, tracking_keys).map(|u| u.to_string()))
            .collect();
        let admission_state = AdmissionState::from_urls(admitted.iter().cloned());

        let mut frontier = Frontier::new();
        let k = pages.len().min(crate::utils::RESUME_REHARVEST_LIMIT);
        for page in &pages[pages.len() - k..] {
            for link in &page.links {
                let Some(canonical) = canonicalize(link, tracking_keys) else {
                    continue;
                };
                if admitted.contains(&canonical.to_string()) {
                    continue;
                }
                frontier.push(FrontierEntry {
                    // Re-harvested depth is not recoverable from a
                    // PageRecord (only the link set is persisted, not
                    // its origin depth); treat every re-seeded link as
                    // depth 1 and let Admission's max_depth check apply
                    // normally from there.
                    url: link.clone(),
                    depth: 1,
                    referrer: Some(page.url.clone()),
                    priority: heuristic_priority(link),
                });
            }
        }

        self.drive(writer, admission_state, frontier, seed, approved_urls, cancel).await
    }

    fn build_seed(&self) -> Result<SeedContext, ArchiveError> {
        let parsed = url::Url::parse(self.config.start_url())
            .map_err(|e| ArchiveError::Config(format!("invalid start_url: {e}")))?;

        let mut hosts = HashSet::new();
        if let Some(extra) = self.config.allowed_domains() {
            hosts.extend(extra.iter().cloned());
        }
        if let Some(host) = parsed.host_str() {
            hosts.insert(host.to_string());
        }

        Ok(SeedContext {
            base_url: self.config.start_url().to_string(),
            allowed_hosts: hosts,
            start_path: parsed.path().to_string(),
            config_digest: self.config.digest(),
        })
    }

    /// The main pipeline loop (spec.md §5): pull, admit, fetch, extract,
    /// persist, repeat, until the frontier is drained, `max_pages` is
    /// reached, or `cancel` fires.
    async fn drive(
        &self,
        mut writer: SessionWriter,
        admission_state: AdmissionState,
        mut frontier: Frontier,
        seed: SeedContext,
        approved_urls: Option<HashSet<String>>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ArchiveError> {
        let session_dir = self.config.cache().directory.join("sessions").join(writer.id().as_ref());
        let temp_dir = session_dir.join("temp");
        std::fs::create_dir_all(&temp_dir).map_err(|source| CacheIoError::Write {
            path: temp_dir.clone(),
            source,
        })?;

        let scheduler = Scheduler::new(self.config.human_behavior());
        let mut fatigue_states: HashMap<String, FatigueState> = HashMap::new();
        let mut cancelled = false;

        while !frontier.is_empty() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if admission_state.count() >= self.config.crawling().max_pages {
                break;
            }

            let Some(entry) = frontier.pop() else { break };

            let decision = admission::decide(
                &entry,
                &admission_state,
                &seed,
                &self.config,
                approved_urls.as_ref(),
                &self.robots,
            )
            .await;

            if !matches!(decision, crate::types::AdmissionDecision::Admit) {
                tracing::debug!(url = %entry.url, decision = ?decision, "admission rejected candidate");
                continue;
            }

            let domain = extract_domain(&entry.url).unwrap_or_default();
            if !self.circuit_breaker.should_attempt(&domain) {
                tracing::warn!(domain, url = %entry.url, "circuit open, skipping host");
                continue;
            }

            let fatigue = fatigue_states.entry(domain.clone()).or_insert_with(FatigueState::new);

            writer.touch_heartbeat();
            if interruptible_sleep(scheduler.reading_delay(fatigue), cancel).await {
                cancelled = true;
                break;
            }

            let _permit = self.domain_limiter.acquire(domain.clone()).await;

            let started = Instant::now();
            let fetch_result = self.fetch_with_retry(&entry.url, cancel).await;
            let elapsed = started.elapsed();
            // A fetch can run long through the retry/back-off ladder;
            // touch the heartbeat on return so doctor()'s staleness check
            // reflects live-but-slow progress rather than a dead session.
            writer.touch_heartbeat();

            match fetch_result {
                Ok((raw, retries, was_rate_limited)) => {
                    self.circuit_breaker.record_success(&domain);
                    if was_rate_limited {
                        fatigue.set_cooldown();
                    }

                    let redirected_in_scope = url::Url::parse(&raw.final_url)
                        .ok()
                        .and_then(|u| u.host_str().map(|h| seed.allowed_hosts.contains(h)))
                        .unwrap_or(false);

                    if !redirected_in_scope {
                        tracing::debug!(
                            url = %entry.url,
                            final_url = %raw.final_url,
                            "redirect left scope, discarding without persisting"
                        );
                        fatigue.record_fetch();
                        continue;
                    }

                    let heading_count = count_headings(&String::from_utf8_lossy(&raw.body));
                    let content_type = content_type_of(&raw);
                    let body_len = raw.body.len();

                    let outcome = FetchOutcome {
                        status: raw.status,
                        final_url: raw.final_url,
                        body: raw.body,
                        content_type,
                        elapsed,
                        was_rate_limited,
                        retries,
                        rate_limited_cooldown_set: was_rate_limited,
                    };

                    let record: PageRecord = extractor::extract(
                        &entry.url,
                        &outcome,
                        self.config.content(),
                        &temp_dir,
                        self.fetcher.as_ref(),
                    )
                    .await;

                    for link in &record.links {
                        frontier.push(FrontierEntry {
                            url: link.clone(),
                            depth: entry.depth + 1,
                            referrer: Some(entry.url.clone()),
                            priority: heuristic_priority(link),
                        });
                    }

                    writer.append_page(&record).await?;
                    fatigue.record_fetch();

                    if let Some(break_delay) = scheduler.session_break_delay(fatigue) {
                        if interruptible_sleep(break_delay, cancel).await {
                            cancelled = true;
                            break;
                        }
                        writer.touch_heartbeat();
                    }

                    let post_delay = scheduler.navigation_delay(fatigue)
                        + scheduler.complexity_delay(fatigue, body_len, heading_count);
                    if interruptible_sleep(post_delay, cancel).await {
                        cancelled = true;
                        break;
                    }
                }
                Err(err) => {
                    self.circuit_breaker.record_failure(&domain, &err.to_string());
                    tracing::warn!(url = %entry.url, error = %err, "fetch failed, skipping candidate");
                    if matches!(err, FetchError::Cancelled) {
                        cancelled = true;
                        break;
                    }
                }
            }
        }

        if cancelled {
            writer.mark_failed("cancelled").await?;
        } else {
            writer.mark_complete().await?;
        }

        Ok(RunOutcome {
            session_id: writer.id().clone(),
            pages_scraped: writer.metadata().pages_scraped,
            cancelled,
        })
    }

    /// Drive one URL through the retry policy, checking `cancel` before
    /// every attempt so a cancellation doesn't start a doomed fetch; an
    /// in-progress back-off sleep itself is not interrupted, matching
    /// spec.md §5's looser guarantee for suspension point (c) relative
    /// to (a).
    async fn fetch_with_retry(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(RawResponse, u32, bool), FetchError> {
        let fetcher = Arc::clone(&self.fetcher);
        let url = url.to_string();

        let (result, attempts) = retry::with_retry(|_attempt| {
            let fetcher = Arc::clone(&fetcher);
            let url = url.clone();
            async move {
                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }
                fetcher.fetch(&url, FETCH_TIMEOUT).await
            }
        })
        .await;

        let was_rate_limited = result.as_ref().err().map(FetchError::is_rate_limited).unwrap_or(false);
        result.map(|raw| (raw, attempts, was_rate_limited))
    }
}
