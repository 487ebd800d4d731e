//! Page rendering seam.
//!
//! The extraction pipeline only ever sees a [`PageRenderer`]: something that
//! can load a URL, report readiness, scroll, answer CSS queries, and dump the
//! current page to disk. [`HttpRenderer`] fetches pages over HTTP and parses
//! them with `scraper`; [`StaticPage`] serves HTML held in memory.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// A source of rendered pages.
///
/// Implementations are driven by one caller at a time; every method that
/// changes page state takes `&mut self`.
#[allow(async_fn_in_trait)]
pub trait PageRenderer {
    /// Loads `url`, replacing the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Whether the current page has finished loading.
    async fn is_ready(&mut self) -> Result<bool, ScraperError>;

    /// Scrolls the viewport to `offset_px` from the top.
    async fn scroll_to(&mut self, offset_px: u32) -> Result<(), ScraperError>;

    /// All elements on the current page matching a CSS selector, in
    /// document order.
    async fn query(&self, selector: &str) -> Result<Vec<PageElement>, ScraperError>;

    /// Writes a snapshot of the current page to `path`.
    async fn capture_snapshot(&self, path: &Path) -> Result<(), ScraperError>;
}

/// An owned view of one element: its flattened text, attributes and markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageElement {
    text: String,
    attrs: HashMap<String, String>,
    html: String,
}

impl PageElement {
    fn from_element(element: ElementRef<'_>) -> Self {
        let text = flatten_text(element);
        let attrs = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();

        Self {
            text,
            attrs,
            html: element.html(),
        }
    }

    /// Visible text. Inline runs are concatenated; block-level elements and
    /// `<br>` start a new line. Whitespace is collapsed within each line.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Outer HTML of the element.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Descendants of this element matching `selector`, excluding the element
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Selector`] if `selector` is not valid CSS.
    pub fn query(&self, selector: &str) -> Result<Vec<PageElement>, ScraperError> {
        let selector = parse_selector(selector)?;
        let fragment = Html::parse_fragment(&self.html);
        let Some(root) = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
        else {
            return Ok(Vec::new());
        };

        Ok(root
            .select(&selector)
            .filter(|el| *el != root)
            .map(PageElement::from_element)
            .collect())
    }
}

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "ul",
];
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

fn flatten_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
            }
            Node::Element(el) => {
                let name = el.name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                push_text(child_ref, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::Selector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

/// Runs `selector` against a full HTML document.
fn select_document(html: &str, selector: &str) -> Result<Vec<PageElement>, ScraperError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(PageElement::from_element)
        .collect())
}

async fn write_snapshot(path: &Path, html: &str) -> Result<(), ScraperError> {
    let snapshot_err = |source| ScraperError::Snapshot {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(snapshot_err)?;
    }
    tokio::fs::write(path, html).await.map_err(snapshot_err)
}

fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

// ---------------------------------------------------------------------------
// HttpRenderer
// ---------------------------------------------------------------------------

/// Renders pages by fetching their HTML over HTTP.
///
/// Only server-rendered markup is visible; scrolling is a no-op since the
/// whole document arrives in one response. Transient errors (429, network
/// failures) are retried with exponential backoff up to `max_retries`
/// additional attempts.
pub struct HttpRenderer {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
    current: Option<String>,
}

impl HttpRenderer {
    /// Builds a renderer with the given request timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
            current: None,
        })
    }

    fn loaded(&self) -> Result<&str, ScraperError> {
        self.current.as_deref().ok_or(ScraperError::NotLoaded)
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    domain: extract_domain(url),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }
}

impl PageRenderer for HttpRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.current = None;
        let html = self.fetch_html(url).await?;
        tracing::debug!(url, bytes = html.len(), "page fetched");
        self.current = Some(html);
        Ok(())
    }

    async fn is_ready(&mut self) -> Result<bool, ScraperError> {
        Ok(self.current.is_some())
    }

    async fn scroll_to(&mut self, _offset_px: u32) -> Result<(), ScraperError> {
        self.loaded().map(|_| ())
    }

    async fn query(&self, selector: &str) -> Result<Vec<PageElement>, ScraperError> {
        select_document(self.loaded()?, selector)
    }

    async fn capture_snapshot(&self, path: &Path) -> Result<(), ScraperError> {
        write_snapshot(path, self.loaded()?).await
    }
}

// ---------------------------------------------------------------------------
// StaticPage
// ---------------------------------------------------------------------------

/// Serves HTML held in memory. Used for offline replays and tests.
///
/// Records every navigation and scroll so callers can inspect how a page was
/// driven.
#[derive(Debug, Default)]
pub struct StaticPage {
    fallback: Option<String>,
    pages: HashMap<String, String>,
    current: Option<String>,
    ready: bool,
    never_ready: bool,
    visited: Vec<String>,
    scroll_offsets: Vec<u32>,
}

impl StaticPage {
    /// Serves `html` for every URL.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            fallback: Some(html.into()),
            ..Self::default()
        }
    }

    /// Serves each `(url, html)` pair; other URLs are [`ScraperError::NotFound`].
    #[must_use]
    pub fn with_pages<I, U, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            pages: pages
                .into_iter()
                .map(|(u, h)| (u.into(), h.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Makes [`PageRenderer::is_ready`] report `false` forever.
    #[must_use]
    pub fn never_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    /// URLs passed to `navigate`, in order, including failed ones.
    #[must_use]
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Offsets passed to `scroll_to`, in order.
    #[must_use]
    pub fn scroll_offsets(&self) -> &[u32] {
        &self.scroll_offsets
    }

    fn loaded(&self) -> Result<&str, ScraperError> {
        self.current.as_deref().ok_or(ScraperError::NotLoaded)
    }
}

impl PageRenderer for StaticPage {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.visited.push(url.to_owned());
        self.current = None;
        self.ready = false;

        let html = self
            .pages
            .get(url)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| ScraperError::NotFound {
                url: url.to_owned(),
            })?;
        self.current = Some(html);
        self.ready = !self.never_ready;
        Ok(())
    }

    async fn is_ready(&mut self) -> Result<bool, ScraperError> {
        Ok(self.ready)
    }

    async fn scroll_to(&mut self, offset_px: u32) -> Result<(), ScraperError> {
        self.loaded()?;
        self.scroll_offsets.push(offset_px);
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<PageElement>, ScraperError> {
        select_document(self.loaded()?, selector)
    }

    async fn capture_snapshot(&self, path: &Path) -> Result<(), ScraperError> {
        write_snapshot(path, self.loaded()?).await
    }
}
