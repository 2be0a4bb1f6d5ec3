use crate::filter::FilterSet;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use smoke_crawler::url::extract_host;
///
/// let url = Url::parse("https://Blog.Example.COM:8443/post").unwrap();
/// assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Decides which discovered links are eligible for crawling
///
/// Out-of-scope links are still recorded on the page that links to them;
/// they are just never enqueued.
#[derive(Debug, Clone)]
pub struct Scope {
    base_host: String,
    filters: FilterSet,
}

impl Scope {
    /// Creates a scope rooted at the host of `base`
    pub fn new(base: &Url, filters: FilterSet) -> Self {
        Self {
            base_host: extract_host(base).unwrap_or_default(),
            filters,
        }
    }

    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    /// Returns true if the URL may be crawled
    ///
    /// The URL must be on the base host or admitted by an inclusion prefix,
    /// and must not match any exclusion pattern.
    pub fn in_scope(&self, url: &Url) -> bool {
        let on_host = extract_host(url).is_some_and(|host| host == self.base_host);

        (on_host || self.filters.includes(url.as_str())) && !self.filters.excludes(url.as_str())
    }
}
