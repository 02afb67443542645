//! PDF generator variant (spec.md §4.6): compose a single cover+TOC+
//! sections HTML document, sanitize each record's content, apply a
//! print stylesheet, and hand the result to an injected
//! [`HtmlToPdfRenderer`] (PDF rendering internals are an external
//! collaborator per spec.md §1). Falls back through three levels on
//! renderer failure rather than aborting the whole document.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use chrono::Utc;

use crate::config::PdfConfig;
use crate::error::RenderError;
use crate::types::PageRecord;

static SCRIPT_STYLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, noscript").expect("BUG: hardcoded selector is invalid")
});
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("BUG: hardcoded 'img[src]' is invalid"));

/// Drop `<script>`/`<style>`/`<noscript>` and resolve relative image
/// `src` attributes against `base_url`. Re-serializing through
/// [`crate::extractor::dom_filter`] additionally closes any unclosed
/// tags left over from the extractor's main-content slice, since that
/// serializer always emits well-formed, self-closed-void markup.
#[must_use]
pub fn sanitize(html: &str, base_url: &url::Url) -> String {
    let document = Html::parse_fragment(html);
    let root = document.root_element();

    let mut to_remove = HashSet::new();
    for el in document.select(&SCRIPT_STYLE_SELECTOR) {
        to_remove.insert(el.id());
    }

    let mut rewrites: Vec<(String, String)> = Vec::new();
    for img in document.select(&IMG_SELECTOR) {
        if let Some(src) = img.value().attr("src") {
            if let Some(resolved) = crate::utils::resolve(base_url, src) {
                if resolved.as_str() != src {
                    rewrites.push((src.to_string(), resolved.to_string()));
                }
            }
        }
    }

    let mut serialized = crate::extractor::dom_filter::serialize_without(&root, &to_remove);
    for (from, to) in rewrites {
        serialized = serialized.replace(&format!("src=\"{from}\""), &format!("src=\"{to}\""));
    }
    serialized
}

/// Renderer failure for one section, with the level of degradation the
/// assembler fell back to.
#[derive(Debug, Clone)]
pub struct SectionFailure {
    pub index: usize,
    pub message: String,
}

/// External collaborator: turns a composed HTML document into PDF
/// bytes. PDF rendering internals are explicitly out of scope (spec.md
/// §1); this crate only defines the seam.
pub trait HtmlToPdfRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// A renderer that always fails, for configurations with no PDF backend
/// wired up. Exercises the full fallback chain deterministically in
/// tests.
pub struct NullPdfRenderer;

impl HtmlToPdfRenderer for NullPdfRenderer {
    fn render(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unavailable)
    }
}

fn print_stylesheet(config: &PdfConfig) -> String {
    let orientation = match config.orientation {
        crate::config::PageOrientation::Portrait => "portrait",
        crate::config::PageOrientation::Landscape => "landscape",
    };
    format!(
        "@page {{ size: {size} {orientation}; margin: 2cm; @bottom-center {{ content: counter(page); }} }}\n\
         body {{ font-family: serif; font-size: 11pt; }}\n\
         h1, h2, h3 {{ page-break-after: avoid; }}\n\
         .page-section {{ page-break-before: always; }}",
        size = config.page_size,
    )
}

fn cover_page(base_url: &str, page_count: usize) -> String {
    let now = Utc::now().to_rfc3339();
    format!(
        "<section class=\"cover\"><h1>Site Archive</h1><p>{base_url}</p><p>Generated {now}</p><p>{page_count} pages</p></section>"
    )
}

fn toc(records: &[PageRecord]) -> String {
    let mut out = String::from("<section class=\"toc\"><h2>Table of Contents</h2><ul>");
    for (index, record) in records.iter().enumerate() {
        let title = if record.title.is_empty() {
            record.url.as_str()
        } else {
            record.title.as_str()
        };
        out.push_str(&format!("<li><a href=\"#page-{index}\">{title}</a></li>"));
    }
    out.push_str("</ul></section>");
    out
}

/// Render one section, falling back through sanitized HTML -> a
/// text-plus-metadata placeholder -> a bare error placeholder, never
/// failing the whole document for one bad record (spec.md §4.6).
fn render_section(
    record: &PageRecord,
    index: usize,
    base_url: &url::Url,
    renderer: &dyn HtmlToPdfRenderer,
) -> (String, Option<SectionFailure>) {
    let sanitized = sanitize(&record.content, base_url);
    let primary = format!(
        "<section class=\"page-section\" id=\"page-{index}\"><h2>{title}</h2><p class=\"source-url\">{url}</p>{body}</section>",
        title = html_escape(if record.title.is_empty() { &record.url } else { &record.title }),
        url = html_escape(&record.final_url),
        body = sanitized,
    );

    match renderer.render(&primary) {
        Ok(_) => (primary, None),
        Err(primary_err) => {
            let fallback = format!(
                "<section class=\"page-section\" id=\"page-{index}\"><h2>{title}</h2><p>{url}</p><p>{text}</p></section>",
                title = html_escape(if record.title.is_empty() { &record.url } else { &record.title }),
                url = html_escape(&record.final_url),
                text = html_escape(&record.text_content),
            );
            match renderer.render(&fallback) {
                Ok(_) => (
                    fallback,
                    Some(SectionFailure {
                        index,
                        message: primary_err.to_string(),
                    }),
                ),
                Err(fallback_err) => (
                    format!(
                        "<section class=\"page-section\" id=\"page-{index}\"><p>Failed to render {url}: {err}</p></section>",
                        url = html_escape(&record.final_url),
                        err = html_escape(&fallback_err.to_string()),
                    ),
                    Some(SectionFailure {
                        index,
                        message: fallback_err.to_string(),
                    }),
                ),
            }
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Compose the full document and invoke `renderer`. Returns the PDF
/// bytes plus any per-section degradations encountered.
pub fn generate(
    records: &[PageRecord],
    base_url: &str,
    config: &PdfConfig,
    renderer: &dyn HtmlToPdfRenderer,
) -> Result<(Vec<u8>, Vec<SectionFailure>), RenderError> {
    let parsed_base = url::Url::parse(base_url).map_err(|e| RenderError::MarkdownConversion(e.to_string()))?;

    let mut body = String::new();
    body.push_str(&cover_page(base_url, records.len()));
    if config.include_toc {
        body.push_str(&toc(records));
    }

    let mut failures = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let (section_html, failure) = render_section(record, index, &parsed_base, renderer);
        body.push_str(&section_html);
        if let Some(f) = failure {
            failures.push(f);
        }
    }

    let document = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>{css}</style></head><body>{body}</body></html>",
        css = print_stylesheet(config),
    );

    let bytes = renderer.render(&document)?;
    Ok((bytes, failures))
}

#[must_use]
pub fn output_filename(config: &PdfConfig) -> String {
    if config.output_filename.is_empty() {
        "output.pdf".to_string()
    } else {
        sanitize_filename::sanitize(&config.output_filename)
    }
}

/// Generate the PDF artifact(s) for a session, honoring chunking, and
/// write them under `output_dir`. Returns the paths written plus any
/// per-section degradations across all chunks.
pub fn generate_to_dir(
    records: &[PageRecord],
    base_url: &str,
    config: &PdfConfig,
    chunking: &crate::config::ChunkingConfig,
    output_dir: &std::path::Path,
    renderer: &dyn HtmlToPdfRenderer,
) -> Result<(Vec<std::path::PathBuf>, Vec<SectionFailure>), RenderError> {
    use super::chunker::{self, OutputFormat};

    std::fs::create_dir_all(output_dir)
        .map_err(|e| RenderError::MarkdownConversion(e.to_string()))?;

    let prefix = output_filename(config);
    let prefix = prefix.strip_suffix(".pdf").unwrap_or(&prefix).to_string();
    let chunks = chunker::partition(records, chunking, OutputFormat::Pdf);

    if chunks.len() <= 1 {
        let (bytes, failures) = generate(records, base_url, config, renderer)?;
        let path = output_dir.join(output_filename(config));
        std::fs::write(&path, bytes).map_err(|e| RenderError::MarkdownConversion(e.to_string()))?;
        return Ok((vec![path], failures));
    }

    let mut paths = Vec::new();
    let mut all_failures = Vec::new();
    for chunk in &chunks {
        let chunk_records: Vec<PageRecord> = chunk.records.iter().map(|r| (*r).clone()).collect();
        let (bytes, mut failures) = generate(&chunk_records, base_url, config, renderer)?;
        all_failures.append(&mut failures);
        let filename = chunker::chunk_filename(&prefix, chunk, "pdf");
        let path = output_dir.join(&filename);
        std::fs::write(&path, bytes).map_err(|e| RenderError::MarkdownConversion(e.to_string()))?;
        paths.push(path);
    }

    let index_path = output_dir.join(chunker::index_filename(&prefix, "txt"));
    let index_body: String = paths
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {}\n", i + 1, p.display()))
        .collect();
    std::fs::write(&index_path, index_body).map_err(|e| RenderError::MarkdownConversion(e.to_string()))?;
    paths.push(index_path);

    Ok((paths, all_failures))
}
