use url::Url;

/// Canonicalise an article URL: strip the query string and the fragment.
///
/// Unparseable input is returned unchanged. The operation is idempotent.
pub fn canonicalise_url(raw: &str) -> String {
    let mut parsed = match Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };
    parsed.set_query(None);
    parsed.set_fragment(None);
    parsed.to_string()
}
