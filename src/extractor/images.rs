//! Image handling (spec.md §4.4 step 4): descriptor collection for every
//! `<img>`, optional local download (sharing the fetcher's per-host
//! serialization per SPEC_FULL.md §9), or textual placeholder synthesis
//! when images are removed.

use std::path::Path;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::config::ContentConfig;
use crate::fetch::FetchCapability;
use crate::types::ImageDescriptor;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("BUG: hardcoded 'img' selector is invalid"));

fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<String> {
    el.value().attr(name).map(str::to_string)
}

/// Collect one [`ImageDescriptor`] per `<img>` in `html`, resolving
/// relative `src` against `base_url`.
#[must_use]
pub fn collect_descriptors(html: &str, base_url: &url::Url) -> Vec<ImageDescriptor> {
    let document = Html::parse_fragment(html);
    document
        .select(&IMG_SELECTOR)
        .filter_map(|img| {
            let raw_src = attr(&img, "src")?;
            let src = base_url
                .join(&raw_src)
                .map(|u| u.to_string())
                .unwrap_or(raw_src);
            Some(ImageDescriptor {
                src,
                local_path: None,
                alt: attr(&img, "alt").unwrap_or_default(),
                title: attr(&img, "title"),
                caption: None,
            })
        })
        .collect()
}

/// Download every descriptor's image body into `temp_dir`, populating
/// `local_path` on success and leaving it `None` on failure (spec.md
/// §8's boundary case: "Image download fails; PageRecord is still
/// written with `local_path` absent for that image").
pub async fn download_images(
    descriptors: &mut [ImageDescriptor],
    temp_dir: &Path,
    fetcher: &dyn FetchCapability,
) {
    if let Err(err) = tokio::fs::create_dir_all(temp_dir).await {
        tracing::warn!(?temp_dir, error = %err, "failed to create image temp dir");
        return;
    }

    for (index, descriptor) in descriptors.iter_mut().enumerate() {
        let timeout = std::time::Duration::from_secs(15);
        match fetcher.fetch(&descriptor.src, timeout).await {
            Ok(response) => {
                let ext = guess_extension(&descriptor.src);
                let filename = format!("img_{index:04}.{ext}");
                let path = temp_dir.join(&filename);
                match tokio::fs::write(&path, &response.body).await {
                    Ok(()) => descriptor.local_path = Some(path.display().to_string()),
                    Err(err) => {
                        tracing::warn!(url = %descriptor.src, error = %err, "failed to write image");
                    }
                }
            }
            Err(err) => {
                tracing::debug!(url = %descriptor.src, error = %err, "image download failed");
            }
        }
    }
}

fn guess_extension(url: &str) -> &'static str {
    let lower = url.to_lowercase();
    for ext in ["png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "bmp"] {
        if lower.ends_with(ext) {
            return ext;
        }
    }
    "bin"
}

/// Replace every `<img>` element with a textual placeholder synthesized
/// from alt → title → cleaned filename → literal `[image removed]`
/// (spec.md §4.4 step 4, `remove_images` path).
#[must_use]
pub fn replace_with_placeholders(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut out = html.to_string();

    // Collect (original_html, placeholder) pairs first: scraper's tree is
    // immutable, so we do a literal string substitution pass rather than
    // mutating the DOM, matching the teacher's regex-substitution style
    // for img replacement in markdown postprocessing.
    let mut replacements = Vec::new();
    for img in document.select(&IMG_SELECTOR) {
        let placeholder = placeholder_text(&img);
        replacements.push((img.html(), placeholder));
    }
    for (original, placeholder) in replacements {
        out = out.replacen(&original, &placeholder, 1);
    }
    out
}

fn placeholder_text(img: &ElementRef) -> String {
    if let Some(alt) = attr(img, "alt") {
        if !alt.trim().is_empty() {
            return format!("[{}]", alt.trim());
        }
    }
    if let Some(title) = attr(img, "title") {
        if !title.trim().is_empty() {
            return format!("[{}]", title.trim());
        }
    }
    if let Some(src) = attr(img, "src") {
        if let Some(filename) = src.rsplit('/').next() {
            if !filename.is_empty() {
                return format!("[{filename}]");
            }
        }
    }
    "[image removed]".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_descriptor_with_resolved_src() {
        let base = url::Url::parse("https://example.com/guide/").unwrap();
        let html = "<img src='../img/a.png' alt='A'>";
        let images = collect_descriptors(html, &base);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src, "https://example.com/img/a.png");
        assert_eq!(images[0].alt, "A");
    }

    #[test]
    fn placeholder_prefers_alt_then_title_then_filename() {
        let html = "<img src='/x/photo.png'>";
        let replaced = replace_with_placeholders(html);
        assert_eq!(replaced, "[photo.png]");

        let html_alt = "<img src='/x/photo.png' alt='A cat'>";
        let replaced_alt = replace_with_placeholders(html_alt);
        assert_eq!(replaced_alt, "[A cat]");
    }
}
