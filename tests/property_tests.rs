//! Generative property tests for the ten universal invariants (spec.md §8):
//! at-most-once scraping, count consistency, scope closure, depth bound,
//! page cap, polite pacing, resume idempotence, doctor repair convergence,
//! chunk partition soundness, and Markdown round-trip. Admission and the
//! Scope Guard are kept pure exactly so these are straightforward to write
//! (spec.md §9).

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use proptest::prelude::*;

use sitecache::admission::{self, AdmissionState};
use sitecache::assembler::chunker::{self, OutputFormat};
use sitecache::assembler::html_to_markdown;
use sitecache::cache::session::SessionWriter;
use sitecache::cache::{doctor, load_session};
use sitecache::config::{
    ArchiveConfig, CacheConfig, ChunkingConfig, HumanBehaviorConfig, PathScopingConfig,
    SizeEstimation,
};
use sitecache::fetch::{FatigueState, Scheduler};
use sitecache::robots::RobotsCache;
use sitecache::scope;
use sitecache::types::{
    AdmissionDecision, FrontierEntry, PageMetadata, PageRecord, RejectReason, SeedContext,
};
use sitecache::utils::canonicalize;

fn seed(start_path: &str) -> SeedContext {
    let mut hosts = HashSet::new();
    hosts.insert("example.com".to_string());
    SeedContext {
        base_url: format!("https://example.com{start_path}"),
        allowed_hosts: hosts,
        start_path: start_path.to_string(),
        config_digest: "deadbeef".to_string(),
    }
}

fn permissive_config() -> ArchiveConfig {
    ArchiveConfig::builder()
        .storage_dir("/tmp/sitecache-proptest")
        .start_url("https://example.com/")
        .respect_robots(false)
        .max_pages(1_000_000)
        .max_depth(1_000_000)
        .path_scoping(PathScopingConfig {
            enabled: false,
            allow_parent_levels: 0,
            allow_homepage: true,
            allow_siblings: false,
            allow_navigation: sitecache::config::AllowNavigation::All,
        })
        .build()
        .unwrap()
}

fn page_record(url: &str, content: &str) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        final_url: url.to_string(),
        title: "t".to_string(),
        content: content.to_string(),
        text_content: content.to_string(),
        metadata: PageMetadata::default(),
        images: Vec::new(),
        links: Vec::new(),
        timestamp: Utc::now(),
        word_count: content.split_whitespace().count(),
        content_type: "text/html".to_string(),
        flags: Vec::new(),
        classification: None,
    }
}

// ---------------------------------------------------------------------
// Property 1: at-most-once scraping — a canonical URL is ever admitted
// at most once within a session's AdmissionState.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_at_most_once_scraping(paths in prop::collection::vec("[a-z]{1,6}", 1..40)) {
        let config = permissive_config();
        let seed_ctx = seed("/");
        let state = AdmissionState::new();
        let robots = RobotsCache::new(reqwest::Client::new());
        let rt = tokio::runtime::Runtime::new().unwrap();

        let mut admit_counts: HashMap<String, u32> = HashMap::new();
        for p in &paths {
            let url = format!("https://example.com/{p}");
            let entry = FrontierEntry { url: url.clone(), depth: 0, referrer: None, priority: 0 };
            let decision = rt.block_on(admission::decide(&entry, &state, &seed_ctx, &config, None, &robots));
            if decision == AdmissionDecision::Admit {
                let canonical = canonicalize(&url, &[]).unwrap().to_string();
                *admit_counts.entry(canonical).or_insert(0) += 1;
            }
        }

        for (_url, count) in admit_counts {
            prop_assert!(count <= 1);
        }
    }
}

// ---------------------------------------------------------------------
// Property 2: count consistency — pages_scraped always equals the number
// of page files actually on disk, observed after every append.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_count_consistency(n in 0usize..12) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SessionWriter::create(dir.path(), &seed("/"), "cafefeed").unwrap();

        for i in 0..n {
            rt.block_on(writer.append_page(&page_record(
                &format!("https://example.com/{i}"),
                "enough content",
            )))
            .unwrap();

            let pages_dir = dir
                .path()
                .join("sessions")
                .join(writer.id().as_ref())
                .join("pages");
            let on_disk = std::fs::read_dir(&pages_dir).unwrap().count();
            prop_assert_eq!(writer.metadata().pages_scraped, on_disk);
            prop_assert_eq!(writer.metadata().pages_scraped, i + 1);
        }
    }
}

// ---------------------------------------------------------------------
// Property 3: scope closure — blocked-technical paths are rejected by
// the Scope Guard regardless of any allow toggle (the tie-break spec.md
// §4.1 states: "blocked-technical wins over any allow").
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_scope_closure_blocked_technical_wins(
        technical_segment in prop::sample::select(vec![
            "wp-admin", "wp-login", "admin", "login", "xmlrpc.php", "feed",
        ]),
        allow_homepage in any::<bool>(),
        allow_siblings in any::<bool>(),
        allow_parent_levels in 0u32..4,
    ) {
        let s = seed("/guide");
        let config = PathScopingConfig {
            enabled: true,
            allow_parent_levels,
            allow_homepage,
            allow_siblings,
            allow_navigation: sitecache::config::AllowNavigation::All,
        };
        // No trailing slash: `canonicalize` strips a final trailing
        // slash, so these end-anchored blocked-technical patterns are
        // matched the way they will actually appear post-canonicalization.
        let url = format!("https://example.com/guide/{technical_segment}");
        let verdict = scope::evaluate(&s, &url, &config, &[]);
        prop_assert_eq!(verdict, sitecache::types::ScopeVerdict::BlockedTechnical);
        prop_assert!(!verdict.is_admitted());
    }

    /// Every verdict Admission's Scope Guard step actually admits is one
    /// of the defined "allowed" variants, never `BlockedTechnical`: the
    /// predicate used to gate admission (`is_admitted`) and the verdict
    /// space itself never drift apart.
    #[test]
    fn prop_scope_closure_admitted_verdicts_are_never_blocked(
        descendant_segment in "[a-z]{1,8}",
    ) {
        let s = seed("/guide");
        let config = PathScopingConfig::default();
        let url = format!("https://example.com/guide/{descendant_segment}");
        let verdict = scope::evaluate(&s, &url, &config, &[]);
        if verdict.is_admitted() {
            prop_assert_ne!(verdict, sitecache::types::ScopeVerdict::BlockedTechnical);
            prop_assert_ne!(verdict, sitecache::types::ScopeVerdict::OutOfScope);
        }
    }
}

// ---------------------------------------------------------------------
// Property 4: depth bound — no candidate whose depth exceeds max_depth
// is ever admitted.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_depth_bound(depth in 0u32..20, max_depth in 0u32..20, path in "[a-z]{1,8}") {
        let config = ArchiveConfig::builder()
            .storage_dir("/tmp/sitecache-proptest")
            .start_url("https://example.com/")
            .respect_robots(false)
            .max_pages(1_000_000)
            .max_depth(max_depth)
            .path_scoping(PathScopingConfig { enabled: false, ..PathScopingConfig::default() })
            .build()
            .unwrap();
        let seed_ctx = seed("/");
        let state = AdmissionState::new();
        let robots = RobotsCache::new(reqwest::Client::new());
        let rt = tokio::runtime::Runtime::new().unwrap();

        let entry = FrontierEntry {
            url: format!("https://example.com/{path}"),
            depth,
            referrer: None,
            priority: 0,
        };
        let decision = rt.block_on(admission::decide(&entry, &state, &seed_ctx, &config, None, &robots));

        if depth > max_depth {
            prop_assert_eq!(decision, AdmissionDecision::Reject(RejectReason::Depth));
        } else {
            prop_assert_ne!(decision, AdmissionDecision::Reject(RejectReason::Depth));
        }
    }
}

// ---------------------------------------------------------------------
// Property 5: page cap — once admitted.count() >= max_pages, every
// further candidate is rejected with RejectReason::Limit.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_page_cap(max_pages in 0usize..10, path in "[a-z]{1,8}") {
        let config = ArchiveConfig::builder()
            .storage_dir("/tmp/sitecache-proptest")
            .start_url("https://example.com/")
            .respect_robots(false)
            .max_pages(max_pages)
            .max_depth(1_000_000)
            .path_scoping(PathScopingConfig { enabled: false, ..PathScopingConfig::default() })
            .build()
            .unwrap();
        let seed_ctx = seed("/");
        let already_admitted: Vec<String> = (0..max_pages)
            .map(|i| format!("https://example.com/seen-{i}"))
            .collect();
        let state = AdmissionState::from_urls(already_admitted);
        let robots = RobotsCache::new(reqwest::Client::new());
        let rt = tokio::runtime::Runtime::new().unwrap();

        let entry = FrontierEntry {
            url: format!("https://example.com/{path}"),
            depth: 0,
            referrer: None,
            priority: 0,
        };
        let decision = rt.block_on(admission::decide(&entry, &state, &seed_ctx, &config, None, &robots));
        prop_assert_eq!(decision, AdmissionDecision::Reject(RejectReason::Limit));
    }
}

// ---------------------------------------------------------------------
// Property 6: polite pacing — the pre-request delay is never shorter
// than `min(base_reading_time) * current_fatigue_multiplier`, modulo a
// small epsilon (spec.md §8 property 6). Variance and weekend factor are
// pinned to neutral values so the bound is exact rather than
// probabilistic.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_polite_pacing_respects_fatigue_scaled_minimum(
        min_secs in 1.0f64..10.0,
        session_break_after in 1u32..20,
        pages_fetched in 0u32..100,
    ) {
        let config = HumanBehaviorConfig {
            base_reading_time: (min_secs, min_secs),
            navigation_decision: (1.0, 1.0),
            variance_percent: 0,
            session_break_after,
            weekend_factor: 1.0,
        };
        let mut fatigue = FatigueState::new();
        for _ in 0..pages_fetched {
            fatigue.record_fetch();
        }
        let multiplier = fatigue.current_multiplier(&config);
        let scheduler = Scheduler::new(&config);
        let delay = scheduler.reading_delay(&fatigue);

        let expected_floor = min_secs * multiplier;
        prop_assert!(delay.as_secs_f64() >= expected_floor - 1e-6);
    }
}

// ---------------------------------------------------------------------
// Property 7: resume idempotence — canonicalization is idempotent, which
// is what makes rebuilding the admitted set from persisted PageRecord
// URLs on resume stable: re-canonicalizing an already-canonical URL
// never changes it (spec.md §8 property 7, §4.5's resume path).
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_resume_idempotence_canonicalize_is_a_fixpoint(
        path in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
        a in "[a-z]{1,5}",
        b in "[a-z]{1,5}",
        fragment in "[a-z]{0,5}",
    ) {
        let tracking = vec!["utm_source".to_string()];
        let raw = format!("https://example.com/{path}?utm_source={a}&z={b}#{fragment}");

        let once = canonicalize(&raw, &tracking).unwrap();
        let twice = canonicalize(once.as_str(), &tracking).unwrap();

        prop_assert_eq!(once.as_str(), twice.as_str());
    }
}

// ---------------------------------------------------------------------
// Property 8: doctor repair convergence — doctor(fix=true) applied twice
// produces the same on-disk state as applied once.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 16, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_doctor_fix_convergence(
        n in 1usize..6,
        corrupt_indices in prop::collection::hash_set(0usize..6, 0..6),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SessionWriter::create(dir.path(), &seed("/"), "cafefeed").unwrap();
        for i in 0..n {
            rt.block_on(writer.append_page(&page_record(&format!("https://example.com/{i}"), "content")))
                .unwrap();
        }
        let id = writer.id().to_string();
        drop(writer);

        let pages_dir = dir.path().join("sessions").join(&id).join("pages");
        for idx in &corrupt_indices {
            if *idx < n {
                let path = pages_dir.join(format!("page_{idx:06}.json"));
                if path.exists() {
                    std::fs::write(&path, b"not valid json").unwrap();
                }
            }
        }

        let cache_config = CacheConfig::default();
        // The first fix pass repairs whatever corruption was injected; a
        // second pass run immediately after must find nothing left to
        // repair, and a third pass must agree with the second exactly
        // (spec.md §8 property 8: fix is idempotent once repair reaches
        // a fixed point).
        let _first = doctor::doctor(dir.path(), &cache_config, true);
        let second = doctor::doctor(dir.path(), &cache_config, true);
        let third = doctor::doctor(dir.path(), &cache_config, true);

        prop_assert!(second.removed_files.is_empty());
        prop_assert!(second.restatused_sessions.is_empty());
        prop_assert!(third.removed_files.is_empty());
        prop_assert!(third.restatused_sessions.is_empty());

        let second_diag = second.diagnoses.iter().find(|d| d.session_id == id);
        let third_diag = third.diagnoses.iter().find(|d| d.session_id == id);
        prop_assert!(second_diag.map(|d| d.is_healthy()).unwrap_or(false));
        prop_assert_eq!(second_diag.map(|d| d.findings.clone()), third_diag.map(|d| d.findings.clone()));

        let (metadata, pages, _) = load_session(dir.path(), &id).unwrap();
        prop_assert_eq!(metadata.pages_scraped, pages.len());
    }
}

// ---------------------------------------------------------------------
// Property 9: chunk partition soundness — chunks are a contiguous
// partition of the PageRecord sequence; concatenating all chunks in
// order reproduces the original sequence.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_chunk_partition_soundness_page_based(n in 0usize..30, page_based_size in 1usize..8) {
        let records: Vec<PageRecord> = (0..n)
            .map(|i| page_record(&format!("https://example.com/{i}"), &"x".repeat(i + 1)))
            .collect();
        let config = ChunkingConfig {
            default_max_size: None,
            page_based_size: Some(page_based_size),
            size_estimation: SizeEstimation::default(),
        };
        let chunks = chunker::partition(&records, &config, OutputFormat::Markdown);

        let flattened: Vec<&str> = chunks.iter().flat_map(|c| c.records.iter().map(|r| r.url.as_str())).collect();
        let original: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        prop_assert_eq!(flattened, original);

        for chunk in &chunks {
            prop_assert!(chunk.records.len() <= page_based_size);
            prop_assert_eq!(chunk.total, chunks.len());
        }
    }

    #[test]
    fn prop_chunk_partition_soundness_size_based(n in 0usize..20, limit in 10u64..500) {
        let records: Vec<PageRecord> = (0..n)
            .map(|i| page_record(&format!("https://example.com/{i}"), &"x".repeat((i % 7) + 1)))
            .collect();
        let config = ChunkingConfig {
            default_max_size: Some(limit.to_string()),
            page_based_size: None,
            size_estimation: SizeEstimation { markdown_overhead: 1.0, pdf_overhead: 1.0 },
        };
        let chunks = chunker::partition(&records, &config, OutputFormat::Markdown);

        let flattened: Vec<&str> = chunks.iter().flat_map(|c| c.records.iter().map(|r| r.url.as_str())).collect();
        let original: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        prop_assert_eq!(flattened, original);

        let total_records: usize = chunks.iter().map(|c| c.records.len()).sum();
        prop_assert_eq!(total_records, n);
    }
}

// ---------------------------------------------------------------------
// Property 10: Markdown round-trip — for the subset of HTML in spec.md
// §6's table, conversion preserves heading levels, link targets, and
// list structure.
// ---------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn prop_markdown_preserves_heading_level(level in 1u8..=6, text in "[a-zA-Z]{1,12}") {
        let html = format!("<h{level}>{text}</h{level}>");
        let md = html_to_markdown::convert(&html);
        let expected_prefix = "#".repeat(level as usize);
        prop_assert!(md.contains(&format!("{expected_prefix} {text}")));
    }

    #[test]
    fn prop_markdown_preserves_link_target(
        href_path in "[a-z]{1,10}",
        text in "[a-zA-Z]{1,12}",
    ) {
        let href = format!("https://example.com/{href_path}");
        let html = format!("<a href=\"{href}\">{text}</a>");
        let md = html_to_markdown::convert(&html);
        prop_assert!(md.contains(&format!("[{text}]({href})")));
    }

    #[test]
    fn prop_markdown_preserves_list_structure(
        items in prop::collection::vec("[a-zA-Z]{1,10}", 1..6),
    ) {
        let html = format!(
            "<ul>{}</ul>",
            items.iter().map(|i| format!("<li>{i}</li>")).collect::<String>()
        );
        let md = html_to_markdown::convert(&html);
        for item in &items {
            prop_assert!(md.contains(&format!("- {item}")));
        }
    }
}
