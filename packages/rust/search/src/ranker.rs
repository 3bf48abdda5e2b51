//! Multi-signal lexical relevance ranking.
//!
//! Each document is scored independently against the query, case-insensitive
//! throughout. Exact-phrase and title matches weigh most, whole-word matches
//! beat bare substring hits, and video documents get a flat nudge on
//! how-to-style queries. Zero-score documents are dropped; ties keep corpus
//! order.

use docdex_shared::{Document, ScoredResult};
use regex::Regex;

/// Full query found in the content as a substring.
const PHRASE_IN_CONTENT: i64 = 10;
/// Full query found in the title as a substring.
const PHRASE_IN_TITLE: i64 = 15;
/// Query token found in the content as a substring.
const TOKEN_IN_CONTENT: i64 = 3;
/// Query token found in the title as a substring.
const TOKEN_IN_TITLE: i64 = 5;
/// Additional weight for a whole-word token match in the content.
const WORD_IN_CONTENT: i64 = 2;
/// Additional weight for a whole-word token match in the title.
const WORD_IN_TITLE: i64 = 3;
/// Flat boost for video documents on how-to-style queries.
const VIDEO_BOOST: i64 = 5;

/// Tokens shorter than this are ignored for per-token scoring.
const MIN_TOKEN_LEN: usize = 3;

/// Query phrases that trigger the video boost.
const VIDEO_BOOST_TERMS: [&str; 5] = ["tutorial", "guide", "video", "example", "how to"];

/// A query token with its compiled whole-word matcher.
struct TokenMatcher {
    token: String,
    word: Regex,
}

/// Score `documents` against `query` and return the top `limit` results in
/// descending relevance order. Deterministic: equal scores keep the input
/// order.
pub fn rank(documents: &[Document], query: &str, limit: usize) -> Vec<ScoredResult> {
    let phrase = query.to_lowercase();
    let boost_videos = VIDEO_BOOST_TERMS.iter().any(|term| phrase.contains(term));

    let tokens: Vec<TokenMatcher> = phrase
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| TokenMatcher {
            token: t.to_string(),
            word: Regex::new(&format!(r"\b{}\b", regex::escape(t))).expect("valid regex"),
        })
        .collect();

    let mut results: Vec<ScoredResult> = documents
        .iter()
        .filter_map(|doc| {
            let score = score_document(doc, &phrase, &tokens, boost_videos);
            (score > 0).then(|| ScoredResult {
                document: doc.clone(),
                relevance_score: score,
            })
        })
        .collect();

    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    results.truncate(limit);
    results
}

fn score_document(
    doc: &Document,
    phrase: &str,
    tokens: &[TokenMatcher],
    boost_videos: bool,
) -> i64 {
    let content = doc.content.to_lowercase();
    let title = doc.title.to_lowercase();

    let mut score = 0;

    if content.contains(phrase) {
        score += PHRASE_IN_CONTENT;
    }
    if title.contains(phrase) {
        score += PHRASE_IN_TITLE;
    }

    for matcher in tokens {
        if content.contains(&matcher.token) {
            score += TOKEN_IN_CONTENT;
        }
        if title.contains(&matcher.token) {
            score += TOKEN_IN_TITLE;
        }
        if matcher.word.is_match(&content) {
            score += WORD_IN_CONTENT;
        }
        if matcher.word.is_match(&title) {
            score += WORD_IN_TITLE;
        }
    }

    if boost_videos && doc.is_video() {
        score += VIDEO_BOOST;
    }

    score
}
