//! Shared types, error model, and configuration for docdex.
//!
//! This crate is the foundation depended on by all other docdex crates.
//! It provides:
//! - [`DocdexError`] — the unified error type
//! - Domain types ([`Document`], [`CrawlSnapshot`], [`ScoredResult`], [`VideoLibrary`])
//! - Configuration ([`AppConfig`], [`RetrievalConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CacheConfig, RetrievalConfig, SiteConfig, VideosConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, normalize_base_url,
};
pub use error::{DocdexError, Result};
pub use types::{
    CrawlSnapshot, Document, ScoredResult, VIDEO_DOC_PREFIX, VideoEntry, VideoLibrary,
    VideoTimestamp,
};
