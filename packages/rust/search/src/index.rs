//! Video library loading and the merged document index.
//!
//! Video records are transformed once, at load time, into flattened
//! [`Document`]s whose content embeds every field, so a single lexical pass
//! over the content searches titles, summaries, topics, and timestamp
//! descriptions alike. The summary sits on the line after the title so the
//! renderer can recover it by position.

use std::path::Path;

use docdex_shared::{Document, VIDEO_DOC_PREFIX, VideoEntry, VideoLibrary};
use tracing::{debug, info, warn};

/// Load the video library file and transform its entries into documents.
///
/// A missing, unreadable, or unparsable file yields an empty set — curated
/// metadata is optional and never blocks retrieval.
pub async fn load_video_documents(path: &Path) -> Vec<Document> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?path, "no video library on disk");
            return Vec::new();
        }
        Err(e) => {
            warn!(?path, error = %e, "failed to read video library");
            return Vec::new();
        }
    };

    let library: VideoLibrary = match serde_json::from_str(&raw) {
        Ok(library) => library,
        Err(e) => {
            warn!(?path, error = %e, "video library is malformed, ignoring");
            return Vec::new();
        }
    };

    let documents: Vec<Document> = library.videos.iter().map(video_to_document).collect();
    info!(?path, videos = documents.len(), "loaded video documents");
    documents
}

/// Flatten one video record into a searchable document.
fn video_to_document(video: &VideoEntry) -> Document {
    let timestamp_lines = video
        .timestamps
        .iter()
        .map(|ts| format!("{}: {}", ts.time, ts.description))
        .collect::<Vec<_>>()
        .join("\n");

    let content = format!(
        "{}\n{}\nTopics: {}\nCategory: {}\nDifficulty: {}\nTimestamps:\n{}",
        video.title,
        video.summary,
        video.topics.join(", "),
        video.category,
        video.difficulty,
        timestamp_lines,
    );

    Document {
        id: format!("{VIDEO_DOC_PREFIX}{}", video.video_id),
        title: video.title.clone(),
        content,
        url: format!("https://www.youtube.com/watch?v={}", video.video_id),
    }
}

// ---------------------------------------------------------------------------
// DocumentIndex
// ---------------------------------------------------------------------------

/// The merged corpus view: crawled documents plus video documents.
///
/// The crawled set is only ever replaced wholesale (at end of crawl), never
/// mutated element by element, so concurrent readers see either the old or
/// the new corpus.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    crawled: Vec<Document>,
    videos: Vec<Document>,
}

impl DocumentIndex {
    /// Build an index over an initial crawled set and the video set.
    pub fn new(crawled: Vec<Document>, videos: Vec<Document>) -> Self {
        Self { crawled, videos }
    }

    /// Swap in a freshly crawled document set.
    pub fn replace_crawled(&mut self, documents: Vec<Document>) {
        self.crawled = documents;
    }

    /// Number of crawled documents currently indexed.
    pub fn crawled_len(&self) -> usize {
        self.crawled.len()
    }

    /// The full corpus, crawled documents first.
    pub fn documents(&self) -> Vec<Document> {
        let mut all = Vec::with_capacity(self.crawled.len() + self.videos.len());
        all.extend(self.crawled.iter().cloned());
        all.extend(self.videos.iter().cloned());
        all
    }

    /// Look up a document by id, crawled set first.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.crawled
            .iter()
            .find(|d| d.id == id)
            .or_else(|| self.videos.iter().find(|d| d.id == id))
    }
}
