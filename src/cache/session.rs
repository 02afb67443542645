//! Single-writer session cache (spec.md §4.5): `SessionWriter` owns the
//! exclusive handle capable of `append_page`/status transitions for one
//! session directory. Per spec.md §4.5's concurrency discipline, the
//! cache itself takes no file locks; single-writer ownership is enforced
//! by the orchestrator holding the only `SessionWriter` (itself `!Clone`)
//! for a session's lifetime. Readers (`load_session`, `doctor`) tolerate
//! a session being written concurrently by snapshotting `session.json`
//! once and reading only the page range it names.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::CacheIoError;
use crate::types::{PageRecord, SeedContext, SessionId, SessionMetadata, SessionStatus};

use super::compression;

fn session_dir(cache_dir: &Path, id: &SessionId) -> PathBuf {
    cache_dir.join("sessions").join(id.as_ref())
}

fn pages_dir(session_dir: &Path) -> PathBuf {
    session_dir.join("pages")
}

fn metadata_path(session_dir: &Path) -> PathBuf {
    session_dir.join("session.json")
}

/// Handle on one session's on-disk state, `!Clone` by construction
/// (holding one by value and never implementing `Clone`/`Copy` is what
/// makes it exclusive — see SPEC_FULL.md §5).
pub struct SessionWriter {
    id: SessionId,
    dir: PathBuf,
    metadata: SessionMetadata,
    next_index: usize,
    compress: bool,
    compression_level: u8,
}

impl SessionWriter {
    /// `create_session` (spec.md §4.5): creates the directory tree and
    /// writes the initial `status=active` metadata.
    pub fn create(
        cache_dir: &Path,
        seed: &SeedContext,
        config_digest: &str,
    ) -> Result<Self, CacheIoError> {
        let host = url::Url::parse(&seed.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "unknown-host".to_string());
        let id = SessionId::new(&host, Utc::now(), config_digest);
        let dir = session_dir(cache_dir, &id);
        std::fs::create_dir_all(pages_dir(&dir)).map_err(|source| CacheIoError::Write {
            path: dir.clone(),
            source,
        })?;

        let now = Utc::now();
        let metadata = SessionMetadata {
            session_id: id.to_string(),
            base_url: seed.base_url.clone(),
            status: SessionStatus::Active,
            created_at: now,
            last_modified: now,
            pages_scraped: 0,
            config_hash: config_digest.to_string(),
            exclude_patterns: Vec::new(),
            cache_size: 0,
            heartbeat: now,
            failure_reason: None,
        };

        let writer = Self {
            id,
            dir,
            metadata,
            next_index: 0,
            compress: false,
            compression_level: 6,
        };
        writer.write_metadata_sync()?;
        Ok(writer)
    }

    /// Reopen an existing session for `--resume` (spec.md §4.5):
    /// re-reads its metadata and every page on disk, resetting status to
    /// `active` and clearing any prior `failure_reason`.
    pub fn reopen(cache_dir: &Path, id: SessionId) -> Result<(Self, Vec<PageRecord>), CacheIoError> {
        let dir = session_dir(cache_dir, &id);
        let mut metadata = super::load::read_metadata(&dir)?;
        let (pages, next_index, skipped) = super::load::read_all_pages(&dir)?;
        if skipped > 0 {
            tracing::warn!(session = %dir.display(), skipped, "resume found corrupt page files, continuing without them");
        }

        metadata.status = SessionStatus::Active;
        metadata.failure_reason = None;
        metadata.heartbeat = Utc::now();

        let writer = Self {
            id,
            dir,
            metadata,
            next_index,
            compress: false,
            compression_level: 6,
        };
        writer.write_metadata_sync()?;
        Ok((writer, pages))
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn set_compression(&mut self, compress: bool, level: u8) {
        self.compress = compress;
        self.compression_level = level;
    }

    /// `append_page` (spec.md §4.5): write the page file atomically, then
    /// atomically rewrite `session.json`. Page indices are strictly
    /// increasing; gaps are never introduced.
    pub async fn append_page(&mut self, record: &PageRecord) -> Result<(), CacheIoError> {
        let index = self.next_index;
        let filename = format!("page_{index:06}.json");
        let path = pages_dir(&self.dir).join(filename);

        let json = serde_json::to_vec_pretty(record).map_err(|source| CacheIoError::Serialize {
            session_id: self.id.to_string(),
            source,
        })?;
        let written_path =
            compression::write_atomic(json, &path, self.compress, self.compression_level).await?;

        self.next_index += 1;
        self.metadata.pages_scraped += 1;
        self.metadata.last_modified = Utc::now();
        self.metadata.heartbeat = Utc::now();
        self.metadata.cache_size += std::fs::metadata(&written_path).map(|m| m.len()).unwrap_or(0);

        self.write_metadata().await
    }

    pub async fn mark_complete(&mut self) -> Result<(), CacheIoError> {
        self.metadata.status = SessionStatus::Completed;
        self.metadata.failure_reason = None;
        self.metadata.last_modified = Utc::now();
        self.write_metadata().await
    }

    pub async fn mark_failed(&mut self, reason: &str) -> Result<(), CacheIoError> {
        self.metadata.status = SessionStatus::Failed;
        self.metadata.failure_reason = Some(reason.to_string());
        self.metadata.last_modified = Utc::now();
        self.write_metadata().await
    }

    pub fn touch_heartbeat(&mut self) {
        self.metadata.heartbeat = Utc::now();
    }

    async fn write_metadata(&self) -> Result<(), CacheIoError> {
        let json =
            serde_json::to_vec_pretty(&self.metadata).map_err(|source| CacheIoError::Serialize {
                session_id: self.id.to_string(),
                source,
            })?;
        compression::write_atomic(json, &metadata_path(&self.dir), false, 0).await?;
        Ok(())
    }

    fn write_metadata_sync(&self) -> Result<(), CacheIoError> {
        let json =
            serde_json::to_vec_pretty(&self.metadata).map_err(|source| CacheIoError::Serialize {
                session_id: self.id.to_string(),
                source,
            })?;
        let path = metadata_path(&self.dir);
        let parent = path.parent().expect("session dir has a parent");
        let mut temp =
            tempfile::NamedTempFile::new_in(parent).map_err(|source| CacheIoError::Write {
                path: path.clone(),
                source,
            })?;
        use std::io::Write as _;
        temp.write_all(&json).map_err(|source| CacheIoError::Write {
            path: path.clone(),
            source,
        })?;
        temp.as_file().sync_all().map_err(|source| CacheIoError::Write {
            path: path.clone(),
            source,
        })?;
        temp.persist(&path).map_err(|e| CacheIoError::Write {
            path,
            source: e.error,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seed() -> SeedContext {
        let mut hosts = HashSet::new();
        hosts.insert("example.com".to_string());
        SeedContext {
            base_url: "https://example.com/guide".to_string(),
            allowed_hosts: hosts,
            start_path: "/guide".to_string(),
            config_digest: "abc123".to_string(),
        }
    }

    fn record(url: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            final_url: url.to_string(),
            title: "t".to_string(),
            content: "<p>c</p>".to_string(),
            text_content: "c".to_string(),
            metadata: Default::default(),
            images: Vec::new(),
            links: Vec::new(),
            timestamp: Utc::now(),
            word_count: 1,
            content_type: "text/html".to_string(),
            flags: Vec::new(),
            classification: None,
        }
    }

    #[tokio::test]
    async fn append_page_increments_count_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SessionWriter::create(dir.path(), &seed(), "abc123").unwrap();

        writer
            .append_page(&record("https://example.com/guide/a"))
            .await
            .unwrap();
        writer
            .append_page(&record("https://example.com/guide/b"))
            .await
            .unwrap();

        assert_eq!(writer.metadata().pages_scraped, 2);
        let page_files: Vec<_> = std::fs::read_dir(pages_dir(&writer.dir))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(page_files.contains(&"page_000000.json".to_string()));
        assert!(page_files.contains(&"page_000001.json".to_string()));
    }

    #[tokio::test]
    async fn mark_complete_then_failed_transitions_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SessionWriter::create(dir.path(), &seed(), "abc123").unwrap();
        writer.mark_complete().await.unwrap();
        assert_eq!(writer.metadata().status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn reopen_resumes_index_without_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SessionWriter::create(dir.path(), &seed(), "abc123").unwrap();
        writer
            .append_page(&record("https://example.com/guide/a"))
            .await
            .unwrap();
        let id = writer.id().clone();
        writer.mark_failed("cancelled").await.unwrap();
        drop(writer);

        let (mut reopened, pages) = SessionWriter::reopen(dir.path(), id).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(reopened.metadata().status, SessionStatus::Active);

        reopened
            .append_page(&record("https://example.com/guide/b"))
            .await
            .unwrap();
        assert_eq!(reopened.metadata().pages_scraped, 2);
        let page_files: Vec<_> = std::fs::read_dir(pages_dir(&reopened.dir))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(page_files.contains(&"page_000001.json".to_string()));
    }
}
