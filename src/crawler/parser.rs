//! HTML parser for extracting text and links
//!
//! This module turns a fetched body into:
//! - The visible text of the page
//! - Absolute web links to follow (from `<a href>` tags)

use crate::CrawlResult;
use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose content is never part of the page text
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "iframe"];

/// Extracted information from a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Visible text, fragments joined by single spaces
    pub text: String,

    /// Absolute http/https links in document order, kept verbatim
    pub links: Vec<String>,
}

/// Turns raw page bytes into text and links
pub trait Parser: Send + Sync {
    fn parse(&self, body: &[u8]) -> CrawlResult<ParsedPage>;
}

/// HTML parser built on scraper
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for HtmlParser {
    fn parse(&self, body: &[u8]) -> CrawlResult<ParsedPage> {
        // Like an HTML5 parser, accept any byte stream; invalid sequences become U+FFFD
        let html = String::from_utf8_lossy(body);
        Ok(parse_html(&html))
    }
}

/// Parses HTML content and extracts text and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose href is an absolute `http` or `https` URL
///
/// **Exclude (silently):**
/// - Relative links, fragments, `mailto:`, `javascript:` and other schemes
///
/// # Text Extraction Rules
///
/// The document is walked depth-first. Text under `script`, `style` and
/// `iframe` elements is skipped, every other fragment is trimmed, empty
/// fragments are dropped and the rest are joined with a single space.
///
/// # Example
///
/// ```
/// use silkworm::crawler::parse_html;
///
/// let html = r#"<html><body><p> Hello </p><a href="https://example.com/a">world</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.text, "Hello world");
/// assert_eq!(parsed.links, vec!["https://example.com/a".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        text: extract_text(&document),
        links: extract_links(&document),
    }
}

/// Collects the visible text of the document
fn extract_text(document: &Html) -> String {
    let mut fragments: Vec<&str> = Vec::new();

    // descendants() is a pre-order walk, so fragments come out in document order
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if skipped {
            continue;
        }

        let fragment = text.trim();
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
    }

    fragments.join(" ").trim().to_string()
}

/// Extracts all followable links from the document
fn extract_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if is_web_link(href) {
                    links.push(href.to_string());
                }
            }
        }
    }

    links
}

/// Returns true if `href` is an absolute http/https URL
fn is_web_link(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}
