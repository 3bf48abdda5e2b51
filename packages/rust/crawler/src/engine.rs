//! Bounded, scope-checked documentation crawler.
//!
//! The crawler starts from the site's base URL and walks an explicit frontier
//! of `(url, depth)` entries. A page is fetched only if it has not been
//! visited, the page cap is not exhausted, the depth bound holds, and the
//! URL is prefixed by the base URL. Individual page failures are logged and
//! skipped; the traversal itself never fails.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use docdex_shared::{DocdexError, Document, Result, RetrievalConfig};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("docdex/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Document id used for the site root, whose relative path slug is empty.
const ROOT_DOC_ID: &str = "home";

// ---------------------------------------------------------------------------
// Settings & outcome
// ---------------------------------------------------------------------------

/// Crawl bounds and scope.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Base URL; only URLs prefixed by it are in scope. Always ends with `/`.
    pub base_url: Url,
    /// Maximum number of documents to produce.
    pub max_pages: usize,
    /// Maximum link depth from the seed page.
    pub max_depth: u32,
}

impl From<&RetrievalConfig> for CrawlSettings {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            max_pages: config.max_pages,
            max_depth: config.max_depth,
        }
    }
}

/// What a completed crawl produced. Best-effort: failed pages are counted,
/// not surfaced as errors.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Documents in traversal order.
    pub documents: Vec<Document>,
    /// Every URL the crawler attempted, including failures.
    pub visited: HashSet<String>,
    /// Number of pages that failed to fetch or read.
    pub pages_failed: usize,
    /// Total duration of the crawl.
    pub duration: Duration,
}

/// A successfully fetched page: its document plus outbound in-scope links.
struct FetchedPage {
    document: Document,
    links: Vec<String>,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential frontier-based crawler.
pub struct Crawler {
    settings: CrawlSettings,
    client: Client,
}

impl Crawler {
    /// Create a new crawler with the given settings.
    pub fn new(settings: CrawlSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DocdexError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    /// Crawl from the base URL, producing cleaned documents and the set of
    /// URLs touched along the way.
    ///
    /// The frontier is a stack; each page's links are pushed in reverse so
    /// the traversal is depth-first along link discovery order. A URL is
    /// marked visited before it is fetched, so a failing page is never
    /// retried within the same run.
    #[instrument(skip_all, fields(base_url = %self.settings.base_url))]
    pub async fn crawl(&self) -> CrawlOutcome {
        let start = Instant::now();
        let base = self.settings.base_url.as_str();

        let mut documents: Vec<Document> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages_failed: usize = 0;
        let mut frontier: Vec<(String, u32)> = vec![(base.to_string(), 0)];

        info!(
            max_pages = self.settings.max_pages,
            max_depth = self.settings.max_depth,
            "starting crawl"
        );

        while let Some((url, depth)) = frontier.pop() {
            if visited.contains(&url)
                || documents.len() >= self.settings.max_pages
                || depth > self.settings.max_depth
                || !url.starts_with(base)
            {
                continue;
            }

            visited.insert(url.clone());
            debug!(%url, depth, "fetching page");

            match self.fetch_page(&url).await {
                Ok(page) => {
                    documents.push(page.document);
                    for link in page.links.into_iter().rev() {
                        if !visited.contains(&link) {
                            frontier.push((link, depth + 1));
                        }
                    }
                }
                Err(e) => {
                    warn!(%url, error = %e, "page fetch failed, skipping");
                    pages_failed += 1;
                }
            }
        }

        let outcome = CrawlOutcome {
            documents,
            visited,
            pages_failed,
            duration: start.elapsed(),
        };

        info!(
            pages = outcome.documents.len(),
            visited = outcome.visited.len(),
            failed = outcome.pages_failed,
            duration_ms = outcome.duration.as_millis(),
            "crawl complete"
        );

        outcome
    }

    /// Fetch one page and extract its document and outbound links.
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocdexError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocdexError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocdexError::Network(format!("{url}: body read failed: {e}")))?;

        let doc = Html::parse_document(&body);
        let parsed_url = Url::parse(url)
            .map_err(|e| DocdexError::parse(format!("{url}: {e}")))?;

        let content = clean_text(&extract_text(&doc));
        let title = clean_text(&extract_title(&doc, &parsed_url));
        let links = extract_links(&doc, &self.settings.base_url);

        Ok(FetchedPage {
            document: Document {
                id: url_to_id(url, &self.settings.base_url),
                title,
                content,
                url: url.to_string(),
            },
            links,
        })
    }
}

// ---------------------------------------------------------------------------
// Content extraction
// ---------------------------------------------------------------------------

/// Flatten a page to text: prefer the `<main>` region, else the `<body>`,
/// with navigation chrome stripped first.
fn extract_text(doc: &Html) -> String {
    let main_sel = Selector::parse("main").unwrap();
    let body_sel = Selector::parse("body").unwrap();

    let html = if let Some(el) = doc.select(&main_sel).next() {
        el.inner_html()
    } else if let Some(body) = doc.select(&body_sel).next() {
        body.inner_html()
    } else {
        return String::new();
    };

    let fragment = Html::parse_fragment(&strip_chrome(&html));
    fragment.root_element().text().collect()
}

/// Strip navigation/header/footer/script/style elements from HTML content.
fn strip_chrome(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let chrome_sel = Selector::parse("nav, header, footer, script, style").unwrap();

    let mut result = html.to_string();
    for el in doc.select(&chrome_sel) {
        let outer = el.html();
        result = result.replace(&outer, "");
    }
    result
}

/// Page title from `<title>`, falling back to the last URL path segment.
fn extract_title(doc: &Html, url: &Url) -> String {
    let title_sel = Selector::parse("title").unwrap();
    let from_tag = doc
        .select(&title_sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|t| !t.trim().is_empty());

    if let Some(title) = from_tag {
        return title;
    }

    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string())
}

/// Collapse all whitespace runs (including newlines) to single spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derive a document id from a URL's path relative to the base:
/// lower-cased, non-alphanumeric runs collapsed to `-`, `home` for the root.
fn url_to_id(url: &str, base_url: &Url) -> String {
    let relative = url
        .strip_prefix(base_url.as_str())
        .unwrap_or(url)
        .trim_end_matches('/');

    let slug = relative
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        ROOT_DOC_ID.to_string()
    } else {
        slug
    }
}

/// Collect followable links: root-relative hrefs resolved against the base,
/// and absolute hrefs already prefixed by the base. Everything else is
/// dropped; fragments are stripped so anchors dedup to their page.
fn extract_links(doc: &Html, base_url: &Url) -> Vec<String> {
    let link_sel = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };

        let resolved = if href.starts_with('/') {
            base_url.join(href)
        } else if href.starts_with(base_url.as_str()) {
            Url::parse(href)
        } else {
            continue;
        };

        if let Ok(mut url) = resolved {
            url.set_fragment(None);
            links.push(url.to_string());
        }
    }

    links
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use docdex_shared::normalize_base_url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base: &str, max_pages: usize, max_depth: u32) -> CrawlSettings {
        CrawlSettings {
            base_url: normalize_base_url(base).expect("base url"),
            max_pages,
            max_depth,
        }
    }

    async fn mount_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    // -----------------------------------------------------------------------
    // Unit tests
    // -----------------------------------------------------------------------

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  hello \n\n  world\t!"), "hello world !");
        assert_eq!(clean_text("\n \t "), "");
    }

    #[test]
    fn url_to_id_slugs_relative_path() {
        let base = normalize_base_url("https://docs.example.com").unwrap();
        assert_eq!(
            url_to_id("https://docs.example.com/guide/getting-started", &base),
            "guide-getting-started"
        );
        assert_eq!(
            url_to_id("https://docs.example.com/API/v2/", &base),
            "api-v2"
        );
    }

    #[test]
    fn url_to_id_root_is_home() {
        let base = normalize_base_url("https://docs.example.com").unwrap();
        assert_eq!(url_to_id("https://docs.example.com/", &base), "home");
    }

    #[test]
    fn extract_title_prefers_title_tag() {
        let doc = Html::parse_document("<html><head><title>My Page</title></head></html>");
        let url = Url::parse("https://docs.example.com/guide/intro").unwrap();
        assert_eq!(extract_title(&doc, &url), "My Page");
    }

    #[test]
    fn extract_title_falls_back_to_path_segment() {
        let doc = Html::parse_document("<html><body><p>no title</p></body></html>");
        let url = Url::parse("https://docs.example.com/guide/intro").unwrap();
        assert_eq!(extract_title(&doc, &url), "intro");
    }

    #[test]
    fn extract_text_prefers_main_and_strips_chrome() {
        let html = r#"<html><body>
            <nav>Site nav</nav>
            <main><script>var x = 1;</script><p>Real content here.</p></main>
            <footer>Footer text</footer>
        </body></html>"#;

        let doc = Html::parse_document(html);
        let text = clean_text(&extract_text(&doc));
        assert_eq!(text, "Real content here.");
    }

    #[test]
    fn extract_text_uses_body_without_main() {
        let html = r#"<html><body>
            <header>Logo</header>
            <p>Body content.</p>
        </body></html>"#;

        let doc = Html::parse_document(html);
        let text = clean_text(&extract_text(&doc));
        assert_eq!(text, "Body content.");
    }

    #[test]
    fn extract_links_scopes_to_base() {
        let html = r##"<html><body>
            <a href="/page2">Root relative</a>
            <a href="https://docs.example.com/page3">Absolute in scope</a>
            <a href="https://other.example.com/page">Other host</a>
            <a href="relative/path">Plain relative</a>
            <a href="/page4#section">Anchored</a>
        </body></html>"##;

        let doc = Html::parse_document(html);
        let base = normalize_base_url("https://docs.example.com").unwrap();
        let links = extract_links(&doc, &base);

        assert_eq!(
            links,
            vec![
                "https://docs.example.com/page2",
                "https://docs.example.com/page3",
                "https://docs.example.com/page4",
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Mock-server crawls
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn crawl_follows_links_and_builds_documents() {
        let server = MockServer::start().await;

        let page1 = r#"<html><head><title>Home</title></head><body>
            <nav>navigation</nav>
            <main><p>Welcome to the docs.</p> <a href="/guide">Guide</a></main>
        </body></html>"#;
        let page2 = r#"<html><head><title>Guide</title></head><body>
            <main><p>How to use the tool.</p></main>
        </body></html>"#;

        mount_page(&server, "/", page1).await;
        mount_page(&server, "/guide", page2).await;

        let crawler = Crawler::new(settings(&server.uri(), 50, 3)).unwrap();
        let outcome = crawler.crawl().await;

        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.pages_failed, 0);

        let root = &outcome.documents[0];
        assert_eq!(root.id, "home");
        assert_eq!(root.title, "Home");
        assert_eq!(root.content, "Welcome to the docs. Guide");

        let guide = &outcome.documents[1];
        assert_eq!(guide.id, "guide");
        assert_eq!(guide.title, "Guide");
    }

    #[tokio::test]
    async fn crawl_respects_max_pages() {
        let server = MockServer::start().await;

        // Seed page links to 5 distinct in-domain pages.
        let seed = r#"<html><body><main>
            <a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>
            <a href="/d">d</a><a href="/e">e</a>
        </main></body></html>"#;

        mount_page(&server, "/", seed).await;
        for route in ["/a", "/b", "/c", "/d", "/e"] {
            mount_page(&server, route, "<html><body><main>leaf</main></body></html>").await;
        }

        let base = normalize_base_url(&server.uri()).unwrap();
        let crawler = Crawler::new(settings(&server.uri(), 2, 3)).unwrap();
        let outcome = crawler.crawl().await;

        assert_eq!(outcome.documents.len(), 2);
        for doc in &outcome.documents {
            assert!(doc.url.starts_with(base.as_str()));
        }
    }

    #[tokio::test]
    async fn crawl_respects_max_depth() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/",
            r#"<html><body><main><a href="/l1">next</a></main></body></html>"#,
        )
        .await;
        mount_page(
            &server,
            "/l1",
            r#"<html><body><main><a href="/l2">next</a></main></body></html>"#,
        )
        .await;
        mount_page(&server, "/l2", "<html><body><main>deep</main></body></html>").await;

        // Depth 1: the seed plus one hop.
        let crawler = Crawler::new(settings(&server.uri(), 50, 1)).unwrap();
        let outcome = crawler.crawl().await;

        assert_eq!(outcome.documents.len(), 2);
        assert!(!outcome.visited.contains(&format!("{}/l2", server.uri())));
    }

    #[tokio::test]
    async fn crawl_visits_cyclic_links_once() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/",
            r#"<html><body><main><a href="/a">a</a></main></body></html>"#,
        )
        .await;
        mount_page(
            &server,
            "/a",
            r#"<html><body><main><a href="/">home</a><a href="/a">self</a></main></body></html>"#,
        )
        .await;

        let crawler = Crawler::new(settings(&server.uri(), 50, 3)).unwrap();
        let outcome = crawler.crawl().await;

        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.visited.len(), 2);
    }

    #[tokio::test]
    async fn crawl_skips_failing_pages_and_continues() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/",
            r#"<html><body><main>
                <a href="/broken">broken</a><a href="/ok">ok</a>
            </main></body></html>"#,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_page(&server, "/ok", "<html><body><main>fine</main></body></html>").await;

        let crawler = Crawler::new(settings(&server.uri(), 50, 3)).unwrap();
        let outcome = crawler.crawl().await;

        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.pages_failed, 1);
        // The failed URL was still marked visited, so it is not retried.
        assert!(outcome.visited.contains(&format!("{}/broken", server.uri())));
    }

    #[tokio::test]
    async fn crawl_stays_within_domain() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/",
            r#"<html><body><main>
                <a href="https://elsewhere.example.com/">external</a>
                <a href="/in">internal</a>
            </main></body></html>"#,
        )
        .await;
        mount_page(&server, "/in", "<html><body><main>in</main></body></html>").await;

        let base = normalize_base_url(&server.uri()).unwrap();
        let crawler = Crawler::new(settings(&server.uri(), 50, 3)).unwrap();
        let outcome = crawler.crawl().await;

        assert_eq!(outcome.documents.len(), 2);
        for url in &outcome.visited {
            assert!(url.starts_with(base.as_str()));
        }
    }
}
