use scraper::{Html, Selector};
use url::Url;

use crate::canon::canonicalise_url;
use crate::fetch::is_media_url;

const MAX_LINKS_PER_HOMEPAGE: usize = 200;

/// Enumerate candidate article URLs from a provider homepage.
///
/// - Resolves relative hrefs against `base_url`
/// - Keeps http(s) links on the provider's own host only
/// - Canonicalises (query and fragment stripped)
/// - Skips plain media links and self-links
/// - Deduplicates preserving first-seen page order, capped at 200
pub fn extract_article_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    let base_host = base.host_str().unwrap_or_default().to_string();
    let canonical_base = canonicalise_url(base_url);

    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").expect("static selector");

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            continue;
        }

        let resolved = match base.join(href) {
            Ok(u) => u,
            Err(_) => continue,
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        // Stay on the provider's own site.
        if resolved.host_str() != Some(base_host.as_str()) {
            continue;
        }

        let canonical = canonicalise_url(resolved.as_str());
        if canonical == canonical_base || is_media_url(&canonical) {
            continue;
        }

        if seen.insert(canonical.clone()) {
            links.push(canonical);
            if links.len() >= MAX_LINKS_PER_HOMEPAGE {
                break;
            }
        }
    }

    links
}
