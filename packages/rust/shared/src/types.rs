//! Core domain types for the docdex corpus.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Id prefix for documents derived from video metadata.
///
/// Crawled-page ids are URL path slugs and never start with this prefix,
/// so the two id spaces cannot collide.
pub const VIDEO_DOC_PREFIX: &str = "video-";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A single searchable document, from either the crawler or the video library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Deterministic identifier: a URL path slug for crawled pages,
    /// [`VIDEO_DOC_PREFIX`] + the external id for video documents.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Cleaned, flattened text content.
    pub content: String,
    /// Source URL.
    pub url: String,
}

impl Document {
    /// Whether this document originated from the video library.
    pub fn is_video(&self) -> bool {
        self.id.starts_with(VIDEO_DOC_PREFIX)
    }
}

// ---------------------------------------------------------------------------
// ScoredResult
// ---------------------------------------------------------------------------

/// A document paired with its relevance score for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub document: Document,
    pub relevance_score: i64,
}

// ---------------------------------------------------------------------------
// CrawlSnapshot
// ---------------------------------------------------------------------------

/// Persisted state of one crawl: the documents, every URL the crawler
/// touched (including failures), and when the snapshot was saved.
///
/// Serialized field names match the on-disk cache format
/// (`documents` / `scrapedUrls` / `timestamp`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSnapshot {
    /// Documents produced by the crawl.
    pub documents: Vec<Document>,
    /// Every URL visited during the crawl, superset of the document URLs.
    #[serde(default)]
    pub scraped_urls: HashSet<String>,
    /// Epoch milliseconds of the save that produced this snapshot.
    #[serde(default)]
    pub timestamp: i64,
}

impl CrawlSnapshot {
    /// An empty snapshot — what a missing or unreadable cache loads as.
    pub fn empty() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Video library (pre-built records)
// ---------------------------------------------------------------------------

/// The external video metadata file.
///
/// Only `videos` feeds the document index; `categories` and
/// `popularUseCases` are part of the file format but unused here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLibrary {
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub popular_use_cases: Vec<String>,
}

/// One curated video record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub title: String,
    pub video_id: String,
    pub summary: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub timestamps: Vec<VideoTimestamp>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
}

/// A labeled offset within a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTimestamp {
    pub time: String,
    pub description: String,
}
