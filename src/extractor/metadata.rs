//! Title and `<meta>` metadata extraction (spec.md §4.4 step 1, and the
//! `content.include_metadata` toggle from spec.md §6).

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::types::PageMetadata;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("BUG: hardcoded 'title' selector is invalid"));
static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("BUG: hardcoded 'meta' selector is invalid"));

#[must_use]
pub fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[must_use]
pub fn extract_metadata(document: &Html) -> PageMetadata {
    let mut metadata = PageMetadata::default();

    for meta in document.select(&META_SELECTOR) {
        let name = meta
            .value()
            .attr("name")
            .or_else(|| meta.value().attr("property"))
            .unwrap_or_default()
            .to_lowercase();
        let Some(content) = meta.value().attr("content") else {
            continue;
        };

        match name.as_str() {
            "description" | "og:description" if metadata.description.is_none() => {
                metadata.description = Some(content.to_string());
            }
            "keywords" => {
                metadata.keywords = content
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
            }
            "author" if metadata.author.is_none() => {
                metadata.author = Some(content.to_string());
            }
            _ => {}
        }
    }

    metadata
}
