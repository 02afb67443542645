//! Gzip compression helpers for page records (spec.md §4.5's
//! `page_NNN.json.gz`). Grounded on the teacher's
//! `content_saver::compression::save_compressed_file`: compress large
//! bodies off the async runtime via `spawn_blocking`, write through a
//! `tempfile::NamedTempFile` in the same directory, and `persist` for an
//! atomic rename.

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;

use crate::error::CacheIoError;
use crate::utils::DEFAULT_COMPRESSION_THRESHOLD_BYTES;

/// Write `bytes` to `path` atomically (temp file + rename). If
/// `compress` is set, `path` is suffixed with `.gz` and the content is
/// gzipped, offloaded to a blocking thread when it exceeds
/// [`DEFAULT_COMPRESSION_THRESHOLD_BYTES`].
pub async fn write_atomic(
    bytes: Vec<u8>,
    path: &Path,
    compress: bool,
    level: u8,
) -> Result<std::path::PathBuf, CacheIoError> {
    let parent = path.parent().ok_or_else(|| CacheIoError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
    })?;
    std::fs::create_dir_all(parent).map_err(|source| CacheIoError::Write {
        path: parent.to_path_buf(),
        source,
    })?;

    let final_path = if compress {
        path.with_extension(format!(
            "{}.gz",
            path.extension().and_then(|e| e.to_str()).unwrap_or("json")
        ))
    } else {
        path.to_path_buf()
    };

    let parent = parent.to_path_buf();
    let target = final_path.clone();
    let large = bytes.len() > DEFAULT_COMPRESSION_THRESHOLD_BYTES;

    let write = move || -> std::io::Result<()> {
        let mut temp = NamedTempFile::new_in(&parent)?;
        if compress {
            let mut encoder = GzEncoder::new(&mut temp, Compression::new(u32::from(level)));
            encoder.write_all(&bytes)?;
            encoder.finish()?;
        } else {
            temp.write_all(&bytes)?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    };

    let result = if large {
        tokio::task::spawn_blocking(write)
            .await
            .map_err(|e| CacheIoError::Write {
                path: final_path.clone(),
                source: std::io::Error::other(e.to_string()),
            })?
    } else {
        write()
    };

    result.map_err(|source| CacheIoError::Write {
        path: final_path.clone(),
        source,
    })?;

    Ok(final_path)
}

/// Read and, if the path ends in `.gz`, transparently decompress a
/// cache-resident file.
pub fn read_maybe_compressed(path: &Path) -> Result<Vec<u8>, CacheIoError> {
    let raw = std::fs::read(path).map_err(|source| CacheIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let mut decoder = GzDecoder::new(raw.as_slice());
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|source| CacheIoError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(out)
    } else {
        Ok(raw)
    }
}
