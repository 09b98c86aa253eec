//! HTML parser for extracting links, metadata and text
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a href>` tags)
//! - Page title and meta description
//! - Anchor texts and visible text used by lemmatization and snippets
//!
//! `scraper::Html` is not `Send`, so every function here parses and drops
//! the document synchronously; async callers only ever hold strings.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Readable parts of an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from `<title>`)
    pub title: Option<String>,

    /// Content of `<meta name="description">`
    pub description: Option<String>,

    /// Text of every `<a>` element, in document order
    pub anchor_texts: Vec<String>,

    /// All visible text, whitespace-normalized
    pub text: String,
}

/// Parses HTML content and extracts its readable parts
///
/// # Example
///
/// ```
/// use lemmadex::crawler::parse_html;
///
/// let html = r#"<html><head><title>Кот</title></head><body><a href="/">Домой</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title.as_deref(), Some("Кот"));
/// assert_eq!(parsed.anchor_texts, vec!["Домой"]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: title_of(&document),
        description: description_of(&document),
        anchor_texts: anchor_texts_of(&document),
        text: visible_text_of(&document),
    }
}

/// Extracts the page title
pub fn extract_title(html: &str) -> Option<String> {
    title_of(&Html::parse_document(html))
}

/// Extracts the content of the meta description tag
pub fn extract_description(html: &str) -> Option<String> {
    description_of(&Html::parse_document(html))
}

/// Extracts the text of every anchor element
pub fn anchor_texts(html: &str) -> Vec<String> {
    anchor_texts_of(&Html::parse_document(html))
}

/// Extracts the text a reader would see
///
/// Text inside `script`, `style` and `noscript` is skipped. Runs of
/// whitespace collapse to a single space.
pub fn visible_text(html: &str) -> String {
    visible_text_of(&Html::parse_document(html))
}

/// Extracts all followable links as absolute URLs
///
/// # Link Extraction Rules
///
/// **Include:**
/// - every `<a href="...">`, resolved against `base_url`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that is not HTTP(S) after resolution
///
/// # Example
///
/// ```
/// use lemmadex::crawler::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com/news/").unwrap();
/// let html = r#"<a href="item-1">One</a><a href="mailto:a@b.c">Mail</a>"#;
/// assert_eq!(extract_links(html, &base), vec!["https://www.example.com/news/item-1"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

fn title_of(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn description_of(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name='description']").ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(normalize_whitespace)
        .find(|s| !s.is_empty())
}

fn anchor_texts_of(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn visible_text_of(document: &Html) -> String {
    let mut pieces = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|element| HIDDEN_ELEMENTS.contains(&element.value().name()));
        if hidden {
            continue;
        }

        let piece = text.trim();
        if !piece.is_empty() {
            pieces.push(piece);
        }
    }

    normalize_whitespace(&pieces.join(" "))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
