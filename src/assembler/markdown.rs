//! Markdown generator variant (spec.md §4.6): single-file with a TOC, or
//! multi-file with a `README.md` index. Slugified, deduplicated anchors
//! and filenames are shared between the two modes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{ChunkingConfig, MarkdownConfig};
use crate::error::{CacheIoError, RenderError};
use crate::types::PageRecord;

use super::chunker::{self, OutputFormat};
use super::html_to_markdown;

/// Lowercase, hyphenated slug from a title, suitable for both an anchor
/// fragment and (with `.md` appended) a filename.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppresses a leading hyphen
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    let trimmed = slug.trim_end_matches('-').to_string();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}

/// Slugify `title`, disambiguating collisions with a numeric suffix
/// (spec.md §4.6: "deduplicated by suffix").
fn unique_slug(title: &str, seen: &mut HashMap<String, usize>) -> String {
    let base = slugify(title);
    let count = seen.entry(base.clone()).or_insert(0);
    let slug = if *count == 0 {
        base.clone()
    } else {
        format!("{base}-{count}")
    };
    *count += 1;
    slug
}

/// The anchor a section is addressed by, in both the TOC and its own
/// `<a id>`. Positional rather than title-derived (spec.md §8 scenario S5
/// is literal: a 3-record TOC must link to `#page-1`, `#page-2`, `#page-3`
/// regardless of what the records are titled), matching the PDF variant's
/// own `page-<index>` anchor scheme so both variants address a section the
/// same way.
fn page_anchor(index: usize) -> String {
    format!("page-{}", index + 1)
}

fn render_section(record: &PageRecord, anchor: &str) -> String {
    let body = html_to_markdown::convert(&record.content);
    format!(
        "<a id=\"{anchor}\"></a>\n\n## {title}\n\n*{url}*\n\n{body}\n",
        title = if record.title.is_empty() {
            &record.url
        } else {
            &record.title
        },
        url = record.final_url,
    )
}

/// Single-file mode: header, optional TOC, then sections separated by
/// `---`.
#[must_use]
pub fn render_single_file(records: &[PageRecord], base_url: &str, config: &MarkdownConfig) -> String {
    let anchors: Vec<String> = (0..records.len()).map(page_anchor).collect();

    let mut out = String::new();
    out.push_str(&format!(
        "# Archive of {base_url}\n\n{} pages archived.\n",
        records.len()
    ));

    if config.include_toc {
        out.push_str("\n## Table of Contents\n\n");
        for (record, anchor) in records.iter().zip(&anchors) {
            let title = if record.title.is_empty() {
                &record.url
            } else {
                &record.title
            };
            out.push_str(&format!("- [{title}](#{anchor})\n"));
        }
    }

    for (record, anchor) in records.iter().zip(&anchors) {
        out.push_str("\n---\n\n");
        out.push_str(&render_section(record, anchor));
    }

    out
}

/// Multi-file mode: a `README.md` index plus one file per record, named
/// by its deduplicated slug. Returns `(filename, content)` pairs; the
/// first is always `README.md`.
#[must_use]
pub fn render_multi_file(records: &[PageRecord], base_url: &str) -> Vec<(String, String)> {
    let mut seen = HashMap::new();
    let slugs: Vec<String> = records
        .iter()
        .map(|r| unique_slug(if r.title.is_empty() { &r.url } else { &r.title }, &mut seen))
        .collect();

    let mut readme = format!(
        "# Archive of {base_url}\n\n{} pages archived.\n\n## Pages\n\n",
        records.len()
    );
    for (record, slug) in records.iter().zip(&slugs) {
        let title = if record.title.is_empty() {
            &record.url
        } else {
            &record.title
        };
        readme.push_str(&format!("- [{title}]({slug}.md)\n"));
    }

    let mut files = vec![("README.md".to_string(), readme)];
    for (record, slug) in records.iter().zip(&slugs) {
        let body = html_to_markdown::convert(&record.content);
        let content = format!(
            "# {title}\n\n*{url}*\n\n{body}\n",
            title = if record.title.is_empty() {
                &record.url
            } else {
                &record.title
            },
            url = record.final_url,
        );
        files.push((format!("{slug}.md"), content));
    }
    files
}

/// Generate the Markdown artifact(s) for a session, honoring chunking.
/// Returns the paths written under `output_dir`.
pub fn generate(
    records: &[PageRecord],
    base_url: &str,
    config: &MarkdownConfig,
    chunking: &ChunkingConfig,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, RenderError> {
    let chunks = chunker::partition(records, chunking, OutputFormat::Markdown);
    let prefix = config
        .output_filename
        .strip_suffix(".md")
        .unwrap_or(&config.output_filename);

    if chunks.len() <= 1 {
        let all_records: Vec<PageRecord> = records.to_vec();
        return Ok(vec![write_variant(
            &all_records,
            base_url,
            config,
            output_dir,
            &config.output_filename,
        )
        .map_err(|e| RenderError::MarkdownConversion(e.to_string()))?]);
    }

    let mut paths = Vec::new();
    for chunk in &chunks {
        let chunk_records: Vec<PageRecord> = chunk.records.iter().map(|r| (*r).clone()).collect();
        let filename = chunker::chunk_filename(prefix, chunk, "md");
        paths.push(
            write_variant(&chunk_records, base_url, config, output_dir, &filename)
                .map_err(|e| RenderError::MarkdownConversion(e.to_string()))?,
        );
    }

    let index_path = output_dir.join(chunker::index_filename(prefix, "md"));
    let index_body = paths
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. [{}]({})\n", i + 1, p.display(), p.display()))
        .collect::<String>();
    std::fs::write(&index_path, index_body)
        .map_err(|e| RenderError::MarkdownConversion(e.to_string()))?;
    paths.push(index_path);

    Ok(paths)
}

fn write_variant(
    records: &[PageRecord],
    base_url: &str,
    config: &MarkdownConfig,
    output_dir: &Path,
    filename: &str,
) -> Result<PathBuf, CacheIoError> {
    std::fs::create_dir_all(output_dir).map_err(|source| CacheIoError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    if config.multi_file {
        let dir = output_dir.join(filename.trim_end_matches(".md"));
        std::fs::create_dir_all(&dir).map_err(|source| CacheIoError::Write {
            path: dir.clone(),
            source,
        })?;
        for (name, content) in render_multi_file(records, base_url) {
            std::fs::write(dir.join(&name), content).map_err(|source| CacheIoError::Write {
                path: dir.join(&name),
                source,
            })?;
        }
        Ok(dir)
    } else {
        let path = output_dir.join(filename);
        let content = render_single_file(records, base_url, config);
        std::fs::write(&path, content).map_err(|source| CacheIoError::Write { path: path.clone(), source })?;
        Ok(path)
    }
}
