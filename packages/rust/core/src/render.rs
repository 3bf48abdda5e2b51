//! Rendering of ranked results into a markdown response.

use docdex_shared::ScoredResult;

/// Fixed response when nothing matched. Callers see this instead of an
/// empty payload, whether the corpus missed the query or is still warming.
pub const NOT_FOUND_MESSAGE: &str =
    "No relevant documentation found for your query. Documentation may still be loading.";

/// Render ranked results as a markdown document.
///
/// Video documents get a marked heading and their one-line summary (the line
/// after the title inside the constructed content); crawled pages get their
/// cleaned content as the snippet.
pub fn render_results(site_name: &str, results: &[ScoredResult]) -> String {
    if results.is_empty() {
        return NOT_FOUND_MESSAGE.to_string();
    }

    let mut out = format!("# Relevant documentation from {site_name}\n\n");

    for result in results {
        let doc = &result.document;
        if doc.is_video() {
            let summary = doc
                .content
                .trim()
                .lines()
                .nth(1)
                .map(str::trim)
                .unwrap_or_default();

            out.push_str(&format!("## 📺 {}\nURL: {}\n\n{summary}\n\n", doc.title, doc.url));
        } else {
            out.push_str(&format!(
                "## {}\nURL: {}\n\n{}\n\n",
                doc.title, doc.url, doc.content
            ));
        }
    }

    out
}
