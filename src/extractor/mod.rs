//! Extractor & Classifier (spec.md §4.4): turns a [`FetchOutcome`] into a
//! [`PageRecord`], running menu exclusion, main-content selection, image
//! handling, classification, the quality gate, and link harvesting.
//! Never fails fatally — parse errors still produce a stub record
//! (spec.md §4.4: "the page still counts against `max_pages`").

pub mod classify;
pub mod dom_filter;
pub mod images;
pub mod links;
pub mod main_content;
pub mod menu;
pub mod metadata;

use chrono::Utc;
use scraper::Html;

use crate::config::ContentConfig;
use crate::fetch::FetchCapability;
use crate::types::{FetchOutcome, PageRecord};

/// Run the full extraction pipeline for one fetched page.
///
/// `temp_dir` is the session's image-download directory
/// (`cache/sessions/<id>/temp/`), used only when
/// `content.include_images && !content.remove_images`.
pub async fn extract(
    url: &str,
    outcome: &FetchOutcome,
    config: &ContentConfig,
    temp_dir: &std::path::Path,
    image_fetcher: &dyn FetchCapability,
) -> PageRecord {
    let body_text = String::from_utf8_lossy(&outcome.body);
    let base_url = match url::Url::parse(&outcome.final_url) {
        Ok(u) => u,
        Err(_) => {
            return stub_record(url, outcome, vec!["parse-error".to_string()]);
        }
    };

    let document = Html::parse_document(&body_text);
    let title = metadata::extract_title(&document);
    let page_metadata = if config.include_metadata {
        metadata::extract_metadata(&document)
    } else {
        Default::default()
    };

    // Links are harvested from the *original* body so menu links still
    // advance the frontier even when menus are stripped from the output
    // (spec.md §4.4 step 7).
    let links = links::harvest(&body_text, &base_url);

    let content_html = if config.include_menus {
        body_text.to_string()
    } else {
        menu::strip_menus(&body_text)
    };
    let main_html = main_content::select(&content_html);

    let mut images = images::collect_descriptors(&main_html, &base_url);
    let rendered_html = if config.remove_images {
        images::replace_with_placeholders(&main_html)
    } else if config.include_images {
        images::download_images(&mut images, temp_dir, image_fetcher).await;
        main_html.clone()
    } else {
        main_html.clone()
    };

    let text_content = Html::parse_fragment(&main_html)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let word_count = text_content.split_whitespace().count();

    let classification = classify::classify(url, &main_html, word_count, config.min_content_length);
    let mut flags = Vec::new();
    if word_count < config.min_content_length
        || classification == crate::types::Classification::LowQuality
    {
        flags.push("low-quality".to_string());
    }

    PageRecord {
        url: url.to_string(),
        final_url: outcome.final_url.clone(),
        title,
        content: rendered_html,
        text_content,
        metadata: page_metadata,
        images,
        links,
        timestamp: Utc::now(),
        word_count,
        content_type: outcome.content_type.clone(),
        flags,
        classification: Some(classification),
    }
}

fn stub_record(url: &str, outcome: &FetchOutcome, flags: Vec<String>) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        final_url: outcome.final_url.clone(),
        title: String::new(),
        content: String::new(),
        text_content: String::new(),
        metadata: Default::default(),
        images: Vec::new(),
        links: Vec::new(),
        timestamp: Utc::now(),
        word_count: 0,
        content_type: outcome.content_type.clone(),
        flags,
        classification: Some(crate::types::Classification::Excluded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ReqwestFetcher;

    fn outcome(body: &str, url: &str) -> FetchOutcome {
        FetchOutcome {
            status: 200,
            final_url: url.to_string(),
            body: body.as_bytes().to_vec(),
            content_type: "text/html".to_string(),
            elapsed: std::time::Duration::from_millis(1),
            was_rate_limited: false,
            retries: 0,
            rate_limited_cooldown_set: false,
        }
    }

    #[tokio::test]
    async fn extracts_title_and_harvests_links() {
        let html = r#"<html><head><title>Guide</title></head>
            <body><main><p>Hello world, this is the main content of the page with enough words to pass the quality gate easily since it needs fifty words minimum and this sentence alone is not enough so here are several more filler words to push the count well past the threshold for this particular unit test case.</p>
            <a href="/other">other</a></main></body></html>"#;
        let outcome = outcome(html, "https://example.com/guide");
        let config = ContentConfig::default();
        let fetcher = ReqwestFetcher::new("test-agent").unwrap();
        let tmp = tempfile::tempdir().unwrap();

        let record = extract(
            "https://example.com/guide",
            &outcome,
            &config,
            tmp.path(),
            &fetcher,
        )
        .await;

        assert_eq!(record.title, "Guide");
        assert!(record.links.iter().any(|l| l.contains("/other")));
        assert!(!record.has_flag("low-quality"));
    }

    #[tokio::test]
    async fn short_page_is_flagged_low_quality() {
        let html = "<html><body><main><p>too short</p></main></body></html>";
        let outcome = outcome(html, "https://example.com/x");
        let config = ContentConfig::default();
        let fetcher = ReqwestFetcher::new("test-agent").unwrap();
        let tmp = tempfile::tempdir().unwrap();

        let record = extract("https://example.com/x", &outcome, &config, tmp.path(), &fetcher)
            .await;
        assert!(record.has_flag("low-quality"));
    }
}
