//! HTML parser for extracting links
//!
//! This module turns an HTML response body into an ordered list of candidate
//! links, each tagged with whether its `rel` attribute contains `nofollow`.

use scraper::{Html, Selector};
use url::Url;

/// A link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL, resolved against the page (or its `<base href>`)
    pub url: Url,

    /// The element's `rel` contains `nofollow`
    pub nofollow: bool,
}

/// Returns true if the content type is HTML-like
///
/// A missing content type is not HTML.
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "text/html" || mime == "application/xhtml+xml"
        })
        .unwrap_or(false)
}

/// Extracts links from an HTML body
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` and `<area href="...">`, in document order
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not HTTP(S) after resolution
///
/// A `<base href>` in the document replaces `base_url` for resolution.
/// Non-HTML content types yield no links. The body may be truncated; the
/// parser is best-effort and never fails.
///
/// # Example
///
/// ```
/// use smoke_crawler::crawler::extract_links;
/// use url::Url;
///
/// let html = br#"<a href="/a">A</a><a href="/b" rel="nofollow">B</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, Some("text/html"), &base);
/// assert_eq!(links.len(), 2);
/// assert!(links[1].nofollow);
/// ```
pub fn extract_links(body: &[u8], content_type: Option<&str>, base_url: &Url) -> Vec<ExtractedLink> {
    if !is_html(content_type) {
        return Vec::new();
    }

    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    let base = document_base(&document, base_url).unwrap_or_else(|| base_url.clone());

    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href], area[href]") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            let Some(url) = resolve_link(href, &base) else {
                continue;
            };

            let nofollow = element
                .value()
                .attr("rel")
                .map(has_nofollow)
                .unwrap_or(false);

            links.push(ExtractedLink { url, nofollow });
        }
    }

    links
}

/// Reads the first `<base href>`, resolved against the response URL
fn document_base(document: &Html, base_url: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    base_url.join(href.trim()).ok()
}

/// Returns true if a `rel` attribute value contains the `nofollow` token
fn has_nofollow(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case("nofollow"))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}
