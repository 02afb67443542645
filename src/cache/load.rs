//! Read-only session cache access: listing, loading, and deleting
//! sessions that no [`super::session::SessionWriter`] currently holds
//! open. Used by the assembler (which only ever reads) and by `doctor`.

use std::path::{Path, PathBuf};

use crate::error::CacheIoError;
use crate::types::{PageRecord, SessionMetadata};

use super::compression;

fn sessions_root(cache_dir: &Path) -> PathBuf {
    cache_dir.join("sessions")
}

pub(super) fn read_metadata(session_dir: &Path) -> Result<SessionMetadata, CacheIoError> {
    let path = session_dir.join("session.json");
    let bytes = std::fs::read(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CacheIoError::SessionNotFound(
                session_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )
        } else {
            CacheIoError::Read {
                path: path.clone(),
                source,
            }
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CacheIoError::Deserialize { path, source })
}

/// Read every `pages/page_NNNNNN.json[.gz]` file in ascending index
/// order. Returns the records, the next free index (so
/// `SessionWriter::reopen` can resume numbering without gaps), and the
/// count of page files that were unreadable or failed to deserialize.
///
/// A single corrupt or truncated page file never aborts the read
/// (spec.md §4.5: "skip and log corrupt files but count them into a
/// 'partial' outcome") — it is logged and excluded from the result.
pub(super) fn read_all_pages(session_dir: &Path) -> Result<(Vec<PageRecord>, usize, usize), CacheIoError> {
    let pages_dir = session_dir.join("pages");
    if !pages_dir.exists() {
        return Ok((Vec::new(), 0, 0));
    }

    let mut entries: Vec<(usize, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&pages_dir).map_err(|source| CacheIoError::Read {
        path: pages_dir.clone(),
        source,
    })? {
        let entry = entry.map_err(|source| CacheIoError::Read {
            path: pages_dir.clone(),
            source,
        })?;
        let path = entry.path();
        let Some(index) = page_index(&path) else {
            continue;
        };
        entries.push((index, path));
    }
    entries.sort_by_key(|(index, _)| *index);

    let mut records = Vec::with_capacity(entries.len());
    let mut next_index = 0;
    let mut corrupt_count = 0;
    for (index, path) in entries {
        let page = compression::read_maybe_compressed(&path).and_then(|bytes| {
            serde_json::from_slice::<PageRecord>(&bytes)
                .map_err(|source| CacheIoError::Deserialize { path: path.clone(), source })
        });
        match page {
            Ok(record) => {
                records.push(record);
                next_index = next_index.max(index + 1);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping corrupt page file");
                corrupt_count += 1;
                next_index = next_index.max(index + 1);
            }
        }
    }

    Ok((records, next_index, corrupt_count))
}

fn page_index(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    // Handles both `page_000001.json` and the `.json.gz` double
    // extension, where `file_stem` only strips the outer `.gz`.
    let stem = stem.strip_suffix(".json").unwrap_or(stem);
    stem.strip_prefix("page_")?.parse().ok()
}

/// Load a complete, read-only view of a session: its metadata and every
/// readable page recorded so far, plus the count of page files that
/// were corrupt and had to be skipped (spec.md §4.5's "partial"
/// outcome — a nonzero count here means the session is partial even
/// though `load_session` itself still returns `Ok`). Does not require
/// exclusive access.
pub fn load_session(
    cache_dir: &Path,
    session_id: &str,
) -> Result<(SessionMetadata, Vec<PageRecord>, usize), CacheIoError> {
    let dir = sessions_root(cache_dir).join(session_id);
    let metadata = read_metadata(&dir)?;
    let (pages, _, skipped) = read_all_pages(&dir)?;
    Ok((metadata, pages, skipped))
}

/// Enumerate every session directory under `cache/sessions/`, skipping
/// any whose `session.json` fails to parse (reported, not raised).
#[must_use]
pub fn list_sessions(cache_dir: &Path) -> Vec<SessionMetadata> {
    let root = sessions_root(cache_dir);
    let Ok(entries) = std::fs::read_dir(&root) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .filter(|e| e.path().is_dir())
        .filter_map(|e| read_metadata(&e.path()).ok())
        .collect()
}

/// Permanently remove a session's directory. Callers are responsible
/// for ensuring no `SessionWriter` currently owns this session (spec.md
/// §4.5: the cache itself enforces no cross-process lock).
pub fn delete_session(cache_dir: &Path, session_id: &str) -> Result<(), CacheIoError> {
    let dir = sessions_root(cache_dir).join(session_id);
    std::fs::remove_dir_all(&dir).map_err(|source| CacheIoError::Write { path: dir, source })
}
