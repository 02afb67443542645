//! Main content selection (spec.md §4.4 step 3): prefer `<main>`, then
//! `<article>`, then `[role="main"]`, then the largest `<div>` by
//! visible text length after menu removal. Grounded on the teacher's
//! `main_content_extraction::extract_main_content` container-priority
//! search, generalized with the largest-div fallback spec.md adds.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::extractor::dom_filter::visible_text_len;

static MAIN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main").expect("BUG: hardcoded 'main' selector is invalid"));
static ARTICLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("article").expect("BUG: hardcoded 'article' selector is invalid")
});
static ROLE_MAIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[role='main']").expect("BUG: hardcoded '[role=main]' selector is invalid")
});
static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("BUG: hardcoded 'div' selector is invalid"));
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("BUG: hardcoded 'body' selector is invalid"));

/// Select the main-content subtree from `menu_stripped_html` (already
/// passed through [`crate::extractor::menu::strip_menus`]). Falls back
/// to the largest `<div>` by visible text, then `<body>`, then the
/// entire input.
#[must_use]
pub fn select(menu_stripped_html: &str) -> String {
    let document = Html::parse_fragment(menu_stripped_html);

    if let Some(el) = document.select(&MAIN_SELECTOR).next() {
        return el.html();
    }
    if let Some(el) = document.select(&ARTICLE_SELECTOR).next() {
        return el.html();
    }
    if let Some(el) = document.select(&ROLE_MAIN_SELECTOR).next() {
        return el.html();
    }

    let largest_div = document
        .select(&DIV_SELECTOR)
        .max_by_key(visible_text_len);
    if let Some(el) = largest_div {
        if visible_text_len(&el) > 0 {
            return el.html();
        }
    }

    if let Some(el) = document.select(&BODY_SELECTOR).next() {
        return el.html();
    }

    menu_stripped_html.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_main_over_article() {
        let html = "<body><article><p>a</p></article><main><p>m</p></main></body>";
        let selected = select(html);
        assert!(selected.contains("<main>"));
    }

    #[test]
    fn falls_back_to_largest_div() {
        let html = "<body><div>short</div><div>a much longer block of visible text content here</div></body>";
        let selected = select(html);
        assert!(selected.contains("much longer"));
    }

    #[test]
    fn falls_back_to_body_when_no_container_matches() {
        let html = "<body><p>just a paragraph</p></body>";
        let selected = select(html);
        assert!(selected.contains("just a paragraph"));
    }
}
