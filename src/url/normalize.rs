use crate::UrlError;
use url::Url;

/// Normalizes a URL, resolving it against `base` when it is relative
///
/// # Normalization Steps
///
/// 1. Resolve against `base` (or parse as absolute); reject if malformed
/// 2. Require an `http` or `https` scheme and a host
/// 3. Lowercase scheme and host, drop the default port, remove dot segments
///    (the `url` crate does this while parsing)
/// 4. Empty path becomes `/`
/// 5. Remove the fragment
///
/// Query strings are kept as-is: for a smoke test `?page=2` is a distinct
/// resource. Normalizing an already-normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use smoke_crawler::url::normalize_url;
/// use url::Url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../b#top", None).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = normalize_url("guide.html", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/guide.html");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let raw = raw.trim();

    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    if url.path().is_empty() {
        url.set_path("/");
    }

    url.set_fragment(None);

    Ok(url)
}
