//! Link resolution for taxonomy and product anchors
//!
//! Every link that ends up in a work item or a product summary passes through
//! [`resolve_link`], so anything dispatched to a worker is an absolute
//! http(s) URL.

use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Example
///
/// ```
/// use catalog_ripple::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example/").unwrap();
/// let link = resolve_link("/skin/serums", &base).unwrap();
/// assert_eq!(link.as_str(), "https://shop.example/skin/serums");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}

/// Collapses runs of whitespace and trims the ends
///
/// Markup text nodes carry indentation and line breaks; every extracted
/// string is normalized through here before it reaches a row.
pub fn clean_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.into_iter().flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
