//! Preview/approval artifact (spec.md §6): the preview/approval TUI is
//! an external collaborator, specified only as a producer of a
//! `PreviewSession` JSON document this crate loads and feeds into
//! Admission's allow/deny pre-seeding.

use std::collections::HashSet;
use std::path::Path;

use crate::error::CacheIoError;
use crate::types::PreviewSession;

/// Load a `preview.json` artifact written by the external preview tool.
pub fn load(path: &Path) -> Result<PreviewSession, CacheIoError> {
    let bytes = std::fs::read(path).map_err(|source| CacheIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CacheIoError::Deserialize {
        path: path.to_path_buf(),
        source,
    })
}

#[must_use]
pub fn approved_set(session: &PreviewSession) -> HashSet<String> {
    session.approved_urls.iter().cloned().collect()
}

#[must_use]
pub fn excluded_set(session: &PreviewSession) -> HashSet<String> {
    session.excluded_urls.iter().cloned().collect()
}
