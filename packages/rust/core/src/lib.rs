//! Retrieval orchestration for docdex.
//!
//! This crate ties the crawler, cache store, and search index together into
//! [`RetrievalService`] — the single entry point hosts use to warm the
//! corpus and answer queries.

pub mod render;
pub mod service;

pub use render::{NOT_FOUND_MESSAGE, render_results};
pub use service::RetrievalService;
