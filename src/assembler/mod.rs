//! Output Assembler (spec.md §4.6): consumes a cached session's
//! PageRecords and emits a PDF or Markdown artifact, chunked or not.
//! Grounded on the teacher's `content_saver` tree for the on-disk
//! writing discipline, generalized to the two output variants and the
//! orthogonal chunker spec.md §4.6 adds.

pub mod chunker;
pub mod html_to_markdown;
pub mod markdown;
pub mod pdf;

use std::path::PathBuf;

use crate::config::ArchiveConfig;
use crate::error::RenderError;
use crate::types::PageRecord;

use pdf::HtmlToPdfRenderer;

/// Which artifact variant to produce. Orthogonal to chunking.
pub enum OutputKind<'a> {
    Markdown,
    Pdf { renderer: &'a dyn HtmlToPdfRenderer },
}

/// Records the quality gate flagged (spec.md §4.4 step 6: "the record
/// is still persisted but flagged; assembler filters by flag"). Kept
/// in the cache for `doctor`/inspection but never shipped into an
/// artifact.
fn is_shippable(record: &PageRecord) -> bool {
    !record.has_flag("low-quality") && !record.has_flag("parse-error")
}

/// `generate(records, config, base_url) -> artifact_path(s)` (spec.md
/// §4.6's shared interface for both generator variants).
pub fn generate(
    records: &[PageRecord],
    config: &ArchiveConfig,
    base_url: &str,
    output_dir: &std::path::Path,
    kind: OutputKind<'_>,
) -> Result<Vec<PathBuf>, RenderError> {
    let shippable: Vec<PageRecord> = records.iter().filter(|r| is_shippable(r)).cloned().collect();
    let records = shippable.as_slice();

    match kind {
        OutputKind::Markdown => markdown::generate(
            records,
            base_url,
            config.markdown(),
            config.chunking(),
            output_dir,
        ),
        OutputKind::Pdf { renderer } => {
            let (paths, failures) = pdf::generate_to_dir(
                records,
                base_url,
                config.pdf(),
                config.chunking(),
                output_dir,
                renderer,
            )?;
            for failure in &failures {
                tracing::warn!(
                    section = failure.index,
                    message = %failure.message,
                    "pdf section degraded to fallback rendering"
                );
            }
            Ok(paths)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageMetadata;
    use chrono::Utc;

    fn record(title: &str, flags: &[&str]) -> PageRecord {
        PageRecord {
            url: format!("https://example.com/{title}"),
            final_url: format!("https://example.com/{title}"),
            title: title.to_string(),
            content: "<p>enough words to clear the gate if it were checked here</p>".to_string(),
            text_content: "enough words to clear the gate if it were checked here".to_string(),
            metadata: PageMetadata::default(),
            images: Vec::new(),
            links: Vec::new(),
            timestamp: Utc::now(),
            word_count: 10,
            content_type: "text/html".to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            classification: None,
        }
    }

    #[test]
    fn flagged_records_are_excluded_from_shippable_set() {
        assert!(is_shippable(&record("good", &[])));
        assert!(!is_shippable(&record("thin", &["low-quality"])));
        assert!(!is_shippable(&record("broken", &["parse-error"])));
    }

    #[test]
    fn generate_drops_flagged_records_before_rendering_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("Good", &[]),
            record("Thin", &["low-quality"]),
            record("Broken", &["parse-error"]),
        ];
        let config = ArchiveConfig::builder()
            .storage_dir(dir.path())
            .start_url("https://example.com")
            .build()
            .unwrap();

        let paths = generate(&records, &config, "https://example.com", dir.path(), OutputKind::Markdown).unwrap();
        let output = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(output.contains("Good"));
        assert!(!output.contains("Thin"));
        assert!(!output.contains("Broken"));
    }
}
