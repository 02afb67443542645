//! Scope Guard (spec.md §4.1): a pure function of `(SeedContext, URL,
//! PathScopingConfig)` that decides whether a candidate URL belongs to
//! the seed's owner-scoped subgraph. No I/O, no shared state — this is
//! what makes it trivial to property-test (spec.md §9).

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::PathScopingConfig;
use crate::types::{ScopeVerdict, SeedContext};
use crate::utils::canonicalize;

/// Path patterns that are rejected regardless of any allow toggle
/// (spec.md §4.1's "administrative or machinery patterns").
static BLOCKED_TECHNICAL: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)/(wp-)?login(/|$)",
        r"(?i)/(wp-)?admin(/|$)",
        r"(?i)/api/",
        r"(?i)/xmlrpc\.php$",
        r"(?i)/(feed|rss|atom)(/|\.xml)?$",
        r"(?i)\.(css|js|json|xml|woff2?|ttf|eot|ico|mp4|mp3|zip|tar|gz|exe|dmg|pdf)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static blocked-technical pattern is valid"))
    .collect()
});

/// Image extensions are explicitly exempt from the static-asset block
/// above (spec.md §4.1: "static asset extensions outside image set").
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "bmp"];

fn is_blocked_technical(path: &str) -> bool {
    if let Some(ext) = path.rsplit('.').next() {
        if IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return false;
        }
    }
    BLOCKED_TECHNICAL.iter().any(|re| re.is_match(path))
}

fn is_same_host(seed: &SeedContext, candidate: &Url) -> bool {
    match candidate.host_str() {
        Some(host) => seed.allowed_hosts.contains(host),
        None => false,
    }
}

/// `true` if `path` is `base` or a path-segment descendant of it.
fn is_descendant(base: &str, path: &str) -> bool {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return true; // seed path is root: everything is a descendant
    }
    path == base || path.starts_with(&format!("{base}/"))
}

/// Immediate parent segment of a path, e.g. `/guide/intro` → `/guide`.
fn parent_path(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "/",
    }
}

/// Evaluate the Scope Guard for one candidate URL. `candidate` should
/// already be canonicalized by the caller via [`crate::utils::canonicalize`]
/// with the same `tracking_keys` used elsewhere in the session — this
/// function re-canonicalizes defensively so it remains correct if called
/// directly in tests.
#[must_use]
pub fn evaluate(
    seed: &SeedContext,
    candidate_url: &str,
    config: &PathScopingConfig,
    tracking_keys: &[String],
) -> ScopeVerdict {
    let Some(candidate) = canonicalize(candidate_url, tracking_keys) else {
        return ScopeVerdict::OutOfScope;
    };

    if is_blocked_technical(candidate.path()) {
        return ScopeVerdict::BlockedTechnical;
    }

    if !is_same_host(seed, &candidate) {
        return ScopeVerdict::OutOfScope;
    }

    if !config.enabled {
        return ScopeVerdict::InScope;
    }

    let cand_path = candidate.path();

    if config.allow_homepage && cand_path == "/" {
        return ScopeVerdict::HomepageAllowed;
    }

    if is_descendant(&seed.start_path, cand_path) {
        return ScopeVerdict::InScope;
    }

    if config.allow_siblings {
        let seed_parent = parent_path(&seed.start_path);
        let cand_parent = parent_path(cand_path);
        if seed_parent == cand_parent {
            return ScopeVerdict::SiblingAllowed;
        }
    }

    if config.allow_parent_levels > 0 {
        let mut ancestor = seed.start_path.trim_end_matches('/').to_string();
        for _ in 0..config.allow_parent_levels {
            ancestor = parent_path(&ancestor).to_string();
            if cand_path == ancestor {
                return ScopeVerdict::ParentAllowed;
            }
        }
    }

    ScopeVerdict::OutOfScope
}
