//! Crawl snapshot cache for docdex.
//!
//! [`CacheStore`] persists one JSON snapshot file per site under a cache
//! directory. The store never surfaces I/O or parse failures to callers:
//! a missing or unreadable snapshot loads as empty, and a failed save is
//! logged and swallowed. The only signal it produces is staleness.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use docdex_shared::CrawlSnapshot;
use tracing::{debug, info, warn};
use url::Url;

/// Suffix for per-site snapshot files.
const CACHE_FILE_SUFFIX: &str = "_cache.json";

/// File-backed store for [`CrawlSnapshot`]s, one file per site.
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the snapshot file for a site: the base URL with every
    /// non-alphanumeric character mapped to `_`, plus the cache suffix.
    pub fn snapshot_path(&self, base_url: &Url) -> PathBuf {
        let safe: String = base_url
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}{CACHE_FILE_SUFFIX}"))
    }

    /// Load the snapshot for a site. A missing, unreadable, or unparsable
    /// file yields an empty snapshot.
    pub async fn load(&self, base_url: &Url) -> CrawlSnapshot {
        let path = self.snapshot_path(base_url);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no cache snapshot on disk");
                return CrawlSnapshot::empty();
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to read cache snapshot");
                return CrawlSnapshot::empty();
            }
        };

        match serde_json::from_str::<CrawlSnapshot>(&raw) {
            Ok(snapshot) => {
                info!(?path, documents = snapshot.documents.len(), "loaded cache snapshot");
                snapshot
            }
            Err(e) => {
                warn!(?path, error = %e, "cache snapshot is corrupt, treating as empty");
                CrawlSnapshot::empty()
            }
        }
    }

    /// Persist a snapshot for a site, stamping it with the current time.
    ///
    /// The whole file is overwritten. Write failures are logged and
    /// swallowed; the caller keeps its in-memory state either way.
    pub async fn save(&self, base_url: &Url, snapshot: &mut CrawlSnapshot) {
        snapshot.timestamp = snapshot.timestamp.max(Utc::now().timestamp_millis());

        let path = self.snapshot_path(base_url);
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = ?self.dir, error = %e, "failed to create cache directory");
            return;
        }

        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(?path, error = %e, "failed to serialize cache snapshot");
                return;
            }
        };

        match tokio::fs::write(&path, json).await {
            Ok(()) => {
                info!(?path, documents = snapshot.documents.len(), "saved cache snapshot");
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to write cache snapshot");
            }
        }
    }

    /// A snapshot is stale when it is older than `ttl` or holds no
    /// documents; either condition triggers a refresh.
    pub fn is_stale(&self, snapshot: &CrawlSnapshot, ttl: Duration) -> bool {
        if snapshot.documents.is_empty() {
            return true;
        }
        let age_ms = Utc::now().timestamp_millis() - snapshot.timestamp;
        age_ms > ttl.as_millis() as i64
    }
}
