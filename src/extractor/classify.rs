//! Content classification (spec.md §4.4 step 5): URL path patterns,
//! element structure, and text/link-ratio heuristics assign one of
//! `{documentation, content, navigation, technical, low-quality,
//! excluded}`. A pure function of `(url, selected html, word count)` so
//! it is trivial to property-test, per spec.md §9's design note.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::types::Classification;

static DOC_PATH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)/docs?(/|$)", r"(?i)/guide(/|$)", r"(?i)/reference(/|$)", r"(?i)/manual(/|$)"]
        .iter()
        .map(|p| Regex::new(p).expect("static doc-path pattern is valid"))
        .collect()
});

static TECHNICAL_PATH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)/changelog(/|$)", r"(?i)/release-notes(/|$)", r"(?i)/api-reference(/|$)"]
        .iter()
        .map(|p| Regex::new(p).expect("static technical-path pattern is valid"))
        .collect()
});

static NAV_PATH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)/(tags?|categor(y|ies)|archive)s?(/|$)", r"(?i)/search(/|$)"]
        .iter()
        .map(|p| Regex::new(p).expect("static nav-path pattern is valid"))
        .collect()
});

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("static heading selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("static link selector"));

fn path_of(url: &str) -> String {
    url::Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default()
}

fn matches_any(path: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(path))
}

/// Classify a page from its URL, selected main-content HTML, and word
/// count. `min_content_length` is the configured quality-gate threshold
/// (spec.md §4.4 step 6); below it and not otherwise classified, a page
/// is `low-quality`. Passed in from [`crate::config::ContentConfig`]
/// rather than a hardcoded default, so the classification agrees with
/// the `low-quality` flag the caller derives from the same threshold.
#[must_use]
pub fn classify(url: &str, main_content_html: &str, word_count: usize, min_content_length: usize) -> Classification {
    let path = path_of(url);

    if matches_any(&path, &TECHNICAL_PATH_PATTERNS) {
        return Classification::Technical;
    }
    if matches_any(&path, &NAV_PATH_PATTERNS) {
        return Classification::Navigation;
    }
    if matches_any(&path, &DOC_PATH_PATTERNS) {
        return Classification::Documentation;
    }

    let document = Html::parse_fragment(main_content_html);
    let heading_count = document.select(&HEADING_SELECTOR).count();
    let link_count = document.select(&LINK_SELECTOR).count();

    if word_count < min_content_length {
        return Classification::LowQuality;
    }

    // Text/link ratio: a page whose content is mostly links, with little
    // heading structure, reads as navigation rather than content.
    if link_count > 0 && word_count > 0 {
        let words_per_link = word_count as f64 / link_count as f64;
        if words_per_link < 3.0 && heading_count == 0 {
            return Classification::Navigation;
        }
    }

    if heading_count >= 1 {
        return Classification::Documentation;
    }

    Classification::Content
}
