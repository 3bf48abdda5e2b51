//! Corpus readiness orchestration and the query surface.
//!
//! [`RetrievalService`] owns the corpus lifecycle: a one-shot initialization
//! (video library + cache snapshot), background refresh when the snapshot is
//! empty or stale, and a blocking crawl on first use against a cold cache.
//! Refreshes are serialized by a single async mutex around the whole
//! evaluate → crawl → save → swap section; the need for a refresh is
//! re-checked after acquiring it, so a caller racing an in-flight refresh
//! awaits that refresh's result instead of starting its own.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, instrument};

use docdex_crawler::{CrawlSettings, Crawler};
use docdex_search::{DocumentIndex, load_video_documents, rank};
use docdex_shared::{CrawlSnapshot, Result, RetrievalConfig, ScoredResult};
use docdex_storage::CacheStore;

use crate::render;

/// Handle to the retrieval subsystem. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RetrievalService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: RetrievalConfig,
    crawler: Crawler,
    cache: CacheStore,
    /// One-shot initialization, awaited by every entry point.
    init: OnceCell<()>,
    corpus: RwLock<CorpusState>,
    /// Serializes the whole evaluate → crawl → save → swap section.
    refresh_gate: Mutex<()>,
    /// Advisory mirror of the gate, readable without blocking.
    refresh_in_flight: AtomicBool,
}

/// The live corpus: the merged index plus the snapshot bookkeeping needed
/// for staleness checks and the next save.
#[derive(Default)]
struct CorpusState {
    index: DocumentIndex,
    visited: HashSet<String>,
    timestamp: i64,
}

/// Clears the advisory in-flight flag even if the refresh path unwinds.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl RetrievalService {
    /// Create a service and begin initializing it in the background.
    ///
    /// Must be called within a Tokio runtime. The returned handle is usable
    /// immediately; [`ensure_ready`](Self::ensure_ready) awaits the warmup.
    pub fn new(config: RetrievalConfig) -> Result<Self> {
        let crawler = Crawler::new(CrawlSettings::from(&config))?;
        let cache = CacheStore::new(&config.cache_dir);

        let service = Self {
            inner: Arc::new(ServiceInner {
                config,
                crawler,
                cache,
                init: OnceCell::new(),
                corpus: RwLock::new(CorpusState::default()),
                refresh_gate: Mutex::new(()),
                refresh_in_flight: AtomicBool::new(false),
            }),
        };

        let warmup = service.clone();
        tokio::spawn(async move {
            warmup.initialized().await;
        });

        Ok(service)
    }

    /// Await readiness: initialization has run, and the corpus has crawled
    /// documents if the site yields any.
    ///
    /// On a cold cache this blocks on a crawl so the very first query has
    /// data to search; otherwise it returns as soon as init has completed.
    #[instrument(skip_all, fields(site = %self.inner.config.base_url))]
    pub async fn ensure_ready(&self) {
        self.initialized().await;

        let empty = self.inner.corpus.read().await.index.crawled_len() == 0;
        if empty {
            self.refresh_if_needed().await;
        }
    }

    /// Rank the current corpus against `query` and return the top `limit`
    /// results. Never fails; an unready corpus just yields fewer results.
    ///
    /// When the crawled set is empty and no refresh is running, a background
    /// refresh is scheduled opportunistically without blocking the caller.
    pub async fn results(&self, query: &str, limit: usize) -> Vec<ScoredResult> {
        self.initialized().await;

        let documents = {
            let corpus = self.inner.corpus.read().await;
            if corpus.index.crawled_len() == 0
                && !self.inner.refresh_in_flight.load(Ordering::SeqCst)
            {
                debug!("corpus empty at query time, scheduling background refresh");
                self.spawn_background_refresh();
            }
            corpus.index.documents()
        };

        rank(&documents, query, limit)
    }

    /// Rank and render results as a markdown response. Never fails; with no
    /// matches the fixed not-found message is returned.
    pub async fn search(&self, query: &str, limit: usize) -> String {
        let results = self.results(query, limit).await;
        render::render_results(&self.inner.config.name, &results)
    }

    /// Look up a single document by id across both corpora.
    pub async fn document(&self, id: &str) -> Option<docdex_shared::Document> {
        self.initialized().await;
        self.inner.corpus.read().await.index.get(id).cloned()
    }

    // -----------------------------------------------------------------------
    // Initialization & refresh
    // -----------------------------------------------------------------------

    /// One-shot init: load the video library and the cache snapshot, then
    /// schedule a background refresh if the snapshot is empty or stale.
    /// Concurrent callers all await the same run; later callers return
    /// immediately.
    async fn initialized(&self) {
        self.inner
            .init
            .get_or_init(|| async {
                let videos = load_video_documents(&self.inner.config.videos_path).await;
                let snapshot = self.inner.cache.load(&self.inner.config.base_url).await;
                let stale = self
                    .inner
                    .cache
                    .is_stale(&snapshot, self.inner.config.cache_ttl);

                info!(
                    cached_documents = snapshot.documents.len(),
                    videos = videos.len(),
                    stale,
                    "retrieval service initialized"
                );

                {
                    let mut corpus = self.inner.corpus.write().await;
                    corpus.visited = snapshot.scraped_urls.clone();
                    corpus.timestamp = snapshot.timestamp;
                    corpus.index = DocumentIndex::new(snapshot.documents, videos);
                }

                if stale {
                    self.spawn_background_refresh();
                }
            })
            .await;
    }

    /// Spawn a refresh task that re-evaluates need under the gate.
    fn spawn_background_refresh(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            service.refresh_if_needed().await;
        });
    }

    /// The serialized refresh section. Waits for any in-flight refresh,
    /// re-checks whether the corpus still needs one, and only then crawls,
    /// saves, and swaps the corpus in wholesale.
    async fn refresh_if_needed(&self) {
        let _gate = self.inner.refresh_gate.lock().await;

        if !self.needs_refresh().await {
            debug!("corpus already fresh, skipping refresh");
            return;
        }

        let _in_flight = InFlightGuard::set(&self.inner.refresh_in_flight);

        let outcome = self.inner.crawler.crawl().await;
        let mut snapshot = CrawlSnapshot {
            documents: outcome.documents,
            scraped_urls: outcome.visited,
            timestamp: 0,
        };
        self.inner
            .cache
            .save(&self.inner.config.base_url, &mut snapshot)
            .await;

        let mut corpus = self.inner.corpus.write().await;
        corpus.visited = snapshot.scraped_urls;
        corpus.timestamp = snapshot.timestamp;
        corpus.index.replace_crawled(snapshot.documents);

        info!(
            documents = corpus.index.crawled_len(),
            failed = outcome.pages_failed,
            "corpus refreshed"
        );
    }

    /// Whether the current corpus is empty or past its TTL.
    async fn needs_refresh(&self) -> bool {
        let corpus = self.inner.corpus.read().await;
        if corpus.index.crawled_len() == 0 {
            return true;
        }
        let age_ms = Utc::now().timestamp_millis() - corpus.timestamp;
        age_ms > self.inner.config.cache_ttl.as_millis() as i64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
