//! HTML→Markdown conversion (spec.md §6's authoritative table), built on
//! the external `htmd` crate. Grounded on the teacher's
//! `content_saver::markdown_converter::custom_handlers::create_converter`:
//! headings and paragraphs get explicit blank-line handlers so adjacent
//! blocks never concatenate, and links fall back to extracted text when
//! the anchor has no href worth keeping. htmd's built-in defaults cover
//! the rest of the table (`strong`/`b`, `em`/`i`, `img`, `ul`/`ol`/`li`,
//! `code`, `pre`, `blockquote`, `hr`) without any custom handler.

use htmd::{
    element_handler::{HandlerResult, Handlers},
    Element, HtmlToMarkdown,
};
use markup5ever_rcdom::NodeData;

fn build_converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .add_handler(vec!["p"], paragraph_handler)
        .add_handler(
            vec!["h1", "h2", "h3", "h4", "h5", "h6"],
            heading_handler,
        )
        .add_handler(vec!["a"], link_handler)
        .build()
}

fn paragraph_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let result = handlers.walk_children(element.node);
    let content = result.content.trim();
    if content.is_empty() {
        return None;
    }
    Some(HandlerResult::from(format!("\n\n{content}\n\n")))
}

fn heading_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let level = match &element.node.data {
        NodeData::Element { name, .. } => match &*name.local {
            "h1" => 1,
            "h2" => 2,
            "h3" => 3,
            "h4" => 4,
            "h5" => 5,
            "h6" => 6,
            _ => return None,
        },
        _ => return None,
    };

    let result = handlers.walk_children(element.node);
    let content = result.content.trim();
    if content.is_empty() {
        return None;
    }
    let prefix = "#".repeat(level);
    Some(HandlerResult::from(format!("\n\n{prefix} {content}\n\n")))
}

fn link_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let href = element
        .attrs
        .iter()
        .find(|(name, _)| name.local.as_ref() == "href")
        .map(|(_, value)| value.as_ref());

    let result = handlers.walk_children(element.node);
    let text = result.content.trim();

    match href {
        None | Some("") | Some("#") => Some(HandlerResult::from(text.to_string())),
        Some(href) => Some(HandlerResult::from(format!("[{text}]({href})"))),
    }
}

/// Convert one PageRecord's sanitized main-content HTML fragment to
/// Markdown. Falls back to the raw input on conversion failure, which
/// `htmd` only returns for malformed UTF-8 input we've already decoded.
#[must_use]
pub fn convert(html: &str) -> String {
    build_converter()
        .convert(html)
        .unwrap_or_else(|_| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_headings_and_paragraphs() {
        let html = "<h1>Title</h1><p>Body text.</p>";
        let md = convert(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("Body text."));
    }

    #[test]
    fn converts_links_with_fallback_for_empty_href() {
        let html = r#"<a href="https://example.com/page">click here</a><a href="#">skip me</a>"#;
        let md = convert(html);
        assert!(md.contains("[click here](https://example.com/page)"));
        assert!(md.contains("skip me"));
        assert!(!md.contains("[skip me]"));
    }

    #[test]
    fn converts_lists_and_emphasis_via_defaults() {
        let html = "<ul><li>one</li><li>two</li></ul><p><strong>bold</strong> and <em>italic</em></p>";
        let md = convert(html);
        assert!(md.contains("- one"));
        assert!(md.contains("- two"));
        assert!(md.contains("**bold**"));
        assert!(md.contains("*italic*"));
    }
}
