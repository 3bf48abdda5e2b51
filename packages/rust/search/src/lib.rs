//! Document indexing and lexical relevance ranking for docdex.
//!
//! This crate provides:
//! - [`index`] — video-library transformation and the merged [`DocumentIndex`]
//! - [`ranker`] — the multi-signal lexical scorer behind every query

pub mod index;
pub mod ranker;

pub use index::{DocumentIndex, load_video_documents};
pub use ranker::rank;
