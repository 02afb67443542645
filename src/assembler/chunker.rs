//! Output chunking (spec.md §4.6): orthogonal to the PDF/Markdown
//! variant. Size-based partitioning takes precedence over page-based
//! when both are configured; chunk partitioning is a deterministic
//! function of the session's records and the chunking config (spec.md
//! §8 property 9).

use crate::config::{ChunkingConfig, SizeEstimation};
use crate::types::{Chunk, PageRecord};

/// Which format's overhead constant to apply when estimating a chunk's
/// rendered size (spec.md §4.6: Markdown ≈ 1.2, PDF ≈ 2.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Pdf,
}

/// Parse a human-readable size like `"10MB"`, `"512 KB"`, or a bare
/// byte count into a byte count. Recognizes `KB`/`MB`/`GB` (1000-based,
/// matching how users write sizes, not `KiB`/`MiB`).
#[must_use]
pub fn parse_size(spec: &str) -> Option<u64> {
    let trimmed = spec.trim();
    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split_at);
    let number: f64 = number.parse().ok()?;
    let multiplier = match unit.trim().to_uppercase().as_str() {
        "" | "B" => 1.0,
        "KB" => 1_000.0,
        "MB" => 1_000_000.0,
        "GB" => 1_000_000_000.0,
        _ => return None,
    };
    Some((number * multiplier) as u64)
}

/// Cheap per-record size estimate: content length scaled by the
/// format's overhead constant (spec.md §4.6).
fn estimate_size(record: &PageRecord, format: OutputFormat, estimation: &SizeEstimation) -> u64 {
    let overhead = match format {
        OutputFormat::Markdown => estimation.markdown_overhead,
        OutputFormat::Pdf => estimation.pdf_overhead,
    };
    (record.content.len() as f64 * overhead) as u64
}

/// Partition `records` into chunks per `config`. With no chunking
/// configured at all, returns a single chunk containing every record.
#[must_use]
pub fn partition<'a>(
    records: &'a [PageRecord],
    config: &ChunkingConfig,
    format: OutputFormat,
) -> Vec<Chunk<'a>> {
    if records.is_empty() {
        return Vec::new();
    }

    let groups: Vec<Vec<&'a PageRecord>> = if let Some(size_str) = &config.default_max_size {
        match parse_size(size_str) {
            Some(limit) => partition_by_size(records, limit, format, &config.size_estimation),
            None => vec![records.iter().collect()],
        }
    } else if let Some(page_count) = config.page_based_size {
        partition_by_page_count(records, page_count.max(1))
    } else {
        vec![records.iter().collect()]
    };

    let total = groups.len();
    groups
        .into_iter()
        .enumerate()
        .map(|(index, records)| Chunk {
            records,
            index,
            total,
        })
        .collect()
}

fn partition_by_size<'a>(
    records: &'a [PageRecord],
    limit: u64,
    format: OutputFormat,
    estimation: &SizeEstimation,
) -> Vec<Vec<&'a PageRecord>> {
    let mut chunks = Vec::new();
    let mut current: Vec<&PageRecord> = Vec::new();
    let mut current_size: u64 = 0;

    for record in records {
        let size = estimate_size(record, format, estimation);
        // A single oversized record becomes its own chunk (spec.md §4.6).
        if size >= limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_size = 0;
            }
            chunks.push(vec![record]);
            continue;
        }

        if current_size + size > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_size = 0;
        }

        current.push(record);
        current_size += size;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn partition_by_page_count(records: &[PageRecord], page_count: usize) -> Vec<Vec<&PageRecord>> {
    records.chunks(page_count).map(|c| c.iter().collect()).collect()
}

/// `<prefix>_chunk_NNN_of_MMM.<ext>` (spec.md §4.6). `NNN`/`MMM` are
/// 1-indexed and zero-padded to 3 digits.
#[must_use]
pub fn chunk_filename(prefix: &str, chunk: &Chunk<'_>, ext: &str) -> String {
    format!(
        "{prefix}_chunk_{:03}_of_{:03}.{ext}",
        chunk.index + 1,
        chunk.total
    )
}

/// `<prefix>_INDEX.<ext>`: the file listing every chunk in order.
#[must_use]
pub fn index_filename(prefix: &str, ext: &str) -> String {
    format!("{prefix}_INDEX.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageMetadata;
    use chrono::Utc;

    fn record(content: &str) -> PageRecord {
        PageRecord {
            url: "https://example.com/".to_string(),
            final_url: "https://example.com/".to_string(),
            title: "t".to_string(),
            content: content.to_string(),
            text_content: content.to_string(),
            metadata: PageMetadata::default(),
            images: Vec::new(),
            links: Vec::new(),
            timestamp: Utc::now(),
            word_count: content.split_whitespace().count(),
            content_type: "text/html".to_string(),
            flags: Vec::new(),
            classification: None,
        }
    }

    #[test]
    fn parses_common_size_strings() {
        assert_eq!(parse_size("10MB"), Some(10_000_000));
        assert_eq!(parse_size("512KB"), Some(512_000));
        assert_eq!(parse_size("1GB"), Some(1_000_000_000));
        assert_eq!(parse_size("100"), Some(100));
        assert_eq!(parse_size("nonsense"), None);
    }

    #[test]
    fn page_based_partition_is_contiguous_and_sound() {
        let records: Vec<_> = (0..5).map(|i| record(&"x".repeat(i + 1))).collect();
        let config = ChunkingConfig {
            default_max_size: None,
            page_based_size: Some(2),
            size_estimation: SizeEstimation::default(),
        };
        let chunks = partition(&records, &config, OutputFormat::Markdown);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].records.len(), 2);
        assert_eq!(chunks[2].records.len(), 1);
        let flattened: Vec<_> = chunks.iter().flat_map(|c| c.records.iter()).collect();
        assert_eq!(flattened.len(), 5);
    }

    #[test]
    fn size_takes_precedence_over_page_count_when_both_set() {
        let records: Vec<_> = (0..3).map(|_| record(&"x".repeat(100))).collect();
        let config = ChunkingConfig {
            default_max_size: Some("150".to_string()),
            page_based_size: Some(10),
            size_estimation: SizeEstimation {
                markdown_overhead: 1.0,
                pdf_overhead: 1.0,
            },
        };
        let chunks = partition(&records, &config, OutputFormat::Markdown);
        assert!(chunks.len() > 1, "size limit should force multiple chunks");
    }

    #[test]
    fn oversized_single_record_becomes_its_own_chunk() {
        let records = vec![record(&"x".repeat(1000))];
        let config = ChunkingConfig {
            default_max_size: Some("10".to_string()),
            page_based_size: None,
            size_estimation: SizeEstimation {
                markdown_overhead: 1.0,
                pdf_overhead: 1.0,
            },
        };
        let chunks = partition(&records, &config, OutputFormat::Markdown);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].records.len(), 1);
    }

    #[test]
    fn chunk_filenames_are_stable() {
        let records = vec![record("a"), record("b")];
        let chunk = Chunk {
            records: records.iter().collect(),
            index: 0,
            total: 3,
        };
        assert_eq!(chunk_filename("output", &chunk, "md"), "output_chunk_001_of_003.md");
        assert_eq!(index_filename("output", "md"), "output_INDEX.md");
    }
}
