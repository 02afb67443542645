//! Link harvesting (spec.md §4.4 step 7): absolute URLs from `<a href>`
//! in the selected main content plus allowed menu areas. Menu links are
//! harvested from the *original* HTML (before menu stripping) so the
//! frontier still advances even when menus are stripped from the output.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::utils::resolve;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("BUG: hardcoded 'a[href]' is invalid"));

/// Harvest every absolute http(s) link from `html`, resolved against
/// `base_url`. Relative, `javascript:`, `mailto:`, and fragment-only
/// hrefs are dropped.
#[must_use]
pub fn harvest(html: &str, base_url: &url::Url) -> Vec<String> {
    let document = Html::parse_fragment(html);
    let mut seen = std::collections::HashSet::new();
    document
        .select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve(base_url, href))
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
