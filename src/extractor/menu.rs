//! Menu exclusion (spec.md §4.4 step 2): strips `<nav>`, ARIA
//! `role="navigation"`, and class/id chrome patterns, plus a
//! density-based pass for elements that look like navigation without
//! being tagged as such, and finally position-based (sidebar) selectors.

use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::extractor::dom_filter::{serialize_without, visible_text_len};
use crate::utils::{DEFAULT_MENU_DENSITY_THRESHOLD, DEFAULT_MENU_LINK_COUNT_THRESHOLD};

static STRUCTURAL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("nav, [role='navigation']")
        .expect("BUG: hardcoded menu selector is invalid")
});

/// Class/id substrings that mark chrome elements (spec.md §4.4 step 2's
/// `menu`, `nav`, `sidebar`, `header`, `footer`, `breadcrumb` list).
const CHROME_PATTERNS: &[&str] = &["menu", "nav", "sidebar", "header", "footer", "breadcrumb"];

/// Position-based selectors tried after the structural pass (spec.md
/// §4.4 step 2: "top/left/right/bottom sidebars").
const POSITION_SELECTORS: &[&str] = &[
    ".sidebar-left",
    ".sidebar-right",
    ".sidebar-top",
    ".sidebar-bottom",
    "#left-sidebar",
    "#right-sidebar",
    "[class*='col-sidebar']",
];

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("BUG: hardcoded 'a' selector is invalid"));

static ALL_ELEMENTS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("BUG: hardcoded '*' selector is invalid"));

fn class_or_id_matches_chrome(element: &ElementRef) -> bool {
    let class = element.value().attr("class").unwrap_or_default().to_lowercase();
    let id = element.value().attr("id").unwrap_or_default().to_lowercase();
    CHROME_PATTERNS
        .iter()
        .any(|p| class.contains(p) || id.contains(p))
}

/// `true` if an element's text-to-link density falls below `threshold`
/// and it has more than `link_count` links — spec.md §4.4 step 2's
/// density heuristic for untagged navigation chrome.
fn is_low_density_chrome(element: &ElementRef, threshold: f64, link_count_limit: usize) -> bool {
    let links: Vec<_> = element.select(&LINK_SELECTOR).collect();
    if links.len() <= link_count_limit {
        return false;
    }
    let text_len = visible_text_len(element) as f64;
    let link_text_len: f64 = links.iter().map(visible_text_len).map(|n| n as f64).sum();
    if text_len <= 0.0 {
        return true;
    }
    (link_text_len / text_len) .is_finite() && (text_len - link_text_len) / text_len < threshold
}

/// Remove menu/chrome elements from `html`, returning the cleaned HTML
/// string. Link harvesting (spec.md §4.4 step 7) happens on the
/// *original* HTML before this function runs, so stripped menu links are
/// still discovered.
#[must_use]
pub fn strip_menus(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let root = document.root_element();

    let mut to_remove: HashSet<NodeId> = HashSet::new();

    for el in document.select(&STRUCTURAL_SELECTOR) {
        to_remove.insert(el.id());
    }

    for el in document.select(&ALL_ELEMENTS_SELECTOR) {
        if to_remove.contains(&el.id()) {
            continue;
        }
        if class_or_id_matches_chrome(&el) {
            to_remove.insert(el.id());
        }
    }

    for el in document.select(&ALL_ELEMENTS_SELECTOR) {
        if to_remove.contains(&el.id()) {
            continue;
        }
        if is_low_density_chrome(
            &el,
            DEFAULT_MENU_DENSITY_THRESHOLD,
            DEFAULT_MENU_LINK_COUNT_THRESHOLD,
        ) {
            to_remove.insert(el.id());
        }
    }

    for selector_str in POSITION_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for el in document.select(&selector) {
                to_remove.insert(el.id());
            }
        }
    }

    serialize_without(&root, &to_remove)
}
