//! Session cache maintenance (spec.md §4.5 `doctor()`): scans every
//! session under `cache/sessions/`, reports orphan page files, unreadable
//! JSON, mismatched counts, and expired `active` sessions, and —
//! with `fix=true` — repairs what it safely can. Dry-run by default.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::CacheConfig;
use crate::types::{SessionMetadata, SessionStatus};

use super::load;

/// One finding against a single session directory. Matches spec.md
/// §4.5's five-item `doctor()` diagnostic list one-for-one: "orphan page
/// files without metadata, unreadable JSON, missing required metadata
/// fields, mismatched counts, and expired active sessions."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A `pages/page_NNNNNN.json[.gz]` file failed to deserialize.
    CorruptPage { file: String },
    /// `pages/` holds page files but `session.json` is missing entirely.
    OrphanPage,
    /// `session.json` exists but isn't valid JSON at all.
    UnreadableMetadata,
    /// `session.json` is valid JSON but is missing (or mistypes) one of
    /// `SessionMetadata`'s required fields.
    MissingFields,
    /// `pages_scraped` in `session.json` didn't match the number of
    /// readable page files on disk.
    CountMismatch { recorded: usize, actual: usize },
    /// `status == active` but `heartbeat` is older than
    /// `session_timeout_hours`.
    ExpiredActive,
}

#[derive(Debug, Clone)]
pub struct SessionDiagnosis {
    pub session_id: String,
    pub findings: Vec<Finding>,
}

impl SessionDiagnosis {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.findings.is_empty()
    }

    /// `partial` per spec.md §4.6: a `completed`/`failed` session with
    /// missing or corrupt pages. Diagnostic only, never persisted.
    #[must_use]
    pub fn is_partial(&self, status: SessionStatus) -> bool {
        matches!(status, SessionStatus::Completed | SessionStatus::Failed)
            && self
                .findings
                .iter()
                .any(|f| matches!(f, Finding::CorruptPage { .. } | Finding::CountMismatch { .. }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub diagnoses: Vec<SessionDiagnosis>,
    /// Page files deleted, populated only when `fix=true`.
    pub removed_files: Vec<PathBuf>,
    /// Sessions re-statused `active` -> `failed`, populated only when
    /// `fix=true`.
    pub restatused_sessions: Vec<String>,
}

/// Scan every session under `cache_dir`, optionally repairing what it
/// finds. Running with `fix=true` twice in a row is idempotent: the
/// second pass finds nothing left to repair (spec.md §8 property 8).
#[must_use]
pub fn doctor(cache_dir: &Path, cache_config: &CacheConfig, fix: bool) -> DoctorReport {
    let mut report = DoctorReport::default();
    let root = cache_dir.join("sessions");
    let Ok(entries) = std::fs::read_dir(&root) else {
        return report;
    };

    for entry in entries.filter_map(Result::ok) {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let session_id = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let metadata = match load::read_metadata(&dir) {
            Ok(m) => m,
            Err(_) => {
                report.diagnoses.push(SessionDiagnosis {
                    session_id,
                    findings: vec![diagnose_missing_metadata(&dir)],
                });
                continue;
            }
        };

        let diagnosis = diagnose(&dir, &metadata, cache_config);

        if fix {
            apply_fix(&dir, &metadata, &diagnosis, &mut report);
        }

        report.diagnoses.push(diagnosis);
    }

    report
}

/// Distinguish *why* `session.json` couldn't be loaded as a
/// `SessionMetadata`, per spec.md §4.5's three separate diagnostics for
/// this case: the file is missing entirely but page files exist
/// (orphan pages), the file exists but isn't valid JSON at all
/// (unreadable JSON), or it's valid JSON that's missing/mistypes a
/// required field (missing fields).
fn diagnose_missing_metadata(dir: &Path) -> Finding {
    let path = dir.join("session.json");
    match std::fs::read(&path) {
        Err(_) => {
            let pages_dir = dir.join("pages");
            let has_pages = std::fs::read_dir(&pages_dir)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);
            if has_pages {
                Finding::OrphanPage
            } else {
                Finding::UnreadableMetadata
            }
        }
        Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Err(_) => Finding::UnreadableMetadata,
            Ok(_) => Finding::MissingFields,
        },
    }
}

fn diagnose(dir: &Path, metadata: &SessionMetadata, cache_config: &CacheConfig) -> SessionDiagnosis {
    let mut findings = Vec::new();

    let pages_dir = dir.join("pages");
    let mut actual = 0usize;
    if let Ok(entries) = std::fs::read_dir(&pages_dir) {
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()).is_none() {
                continue;
            }
            match super::compression::read_maybe_compressed(&path).and_then(|bytes| {
                serde_json::from_slice::<crate::types::PageRecord>(&bytes).map_err(|source| {
                    crate::error::CacheIoError::Deserialize {
                        path: path.clone(),
                        source,
                    }
                })
            }) {
                Ok(_) => actual += 1,
                Err(_) => findings.push(Finding::CorruptPage {
                    file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                }),
            }
        }
    }

    if actual != metadata.pages_scraped {
        findings.push(Finding::CountMismatch {
            recorded: metadata.pages_scraped,
            actual,
        });
    }

    if metadata.status == SessionStatus::Active {
        let age = Utc::now().signed_duration_since(metadata.heartbeat);
        if age.num_hours() >= cache_config.session_timeout_hours {
            findings.push(Finding::ExpiredActive);
        }
    }

    SessionDiagnosis {
        session_id: metadata.session_id.clone(),
        findings,
    }
}

fn apply_fix(
    dir: &Path,
    metadata: &SessionMetadata,
    diagnosis: &SessionDiagnosis,
    report: &mut DoctorReport,
) {
    let mut reconciled = metadata.clone();
    let mut changed = false;

    for finding in &diagnosis.findings {
        match finding {
            Finding::CorruptPage { file } => {
                let path = dir.join("pages").join(file);
                if std::fs::remove_file(&path).is_ok() {
                    report.removed_files.push(path);
                }
            }
            Finding::ExpiredActive => {
                reconciled.status = SessionStatus::Failed;
                reconciled.failure_reason = Some("session timed out".to_string());
                changed = true;
                report.restatused_sessions.push(metadata.session_id.clone());
            }
            Finding::CountMismatch { .. }
            | Finding::UnreadableMetadata
            | Finding::OrphanPage
            | Finding::MissingFields => {}
        }
    }

    // Recount after removing corrupt files so `pages_scraped` reflects
    // what actually survives on disk.
    if let Ok((pages, _, _)) = load::read_all_pages(dir) {
        if pages.len() != reconciled.pages_scraped {
            reconciled.pages_scraped = pages.len();
            changed = true;
        }
    }

    if changed {
        if let Ok(json) = serde_json::to_vec_pretty(&reconciled) {
            let _ = std::fs::write(dir.join("session.json"), json);
        }
    }
}
