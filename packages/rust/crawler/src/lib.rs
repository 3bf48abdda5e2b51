//! Web crawler for docdex.
//!
//! This crate provides [`Crawler`] — a sequential, scope-checked frontier
//! crawler that turns a documentation site into cleaned [`docdex_shared::Document`]s.

pub mod engine;

pub use engine::{CrawlOutcome, CrawlSettings, Crawler};
