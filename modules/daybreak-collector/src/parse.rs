use chrono::{NaiveDate, NaiveDateTime};
use scraper::{Html, Selector};
use url::Url;

use daybreak_common::DigestError;

/// Everything extracted from one article page. The publish time is the
/// provider's local wall-clock time; timezone normalisation happens later.
#[derive(Debug, Clone, Default)]
pub struct ParsedArticle {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub published: Option<NaiveDateTime>,
    pub cover_image: Option<String>,
    pub image_urls: Vec<String>,
}

/// HTML-to-article extraction. External collaborator boundary: the collector
/// depends only on this trait.
pub trait ArticleParser: Send + Sync {
    fn parse(&self, html: &str, url: &str) -> Result<ParsedArticle, DigestError>;
}

/// Parser reading standard page metadata: Open Graph tags, meta description,
/// `article:published_time` / `<time datetime>` / LD-JSON `datePublished`,
/// and paragraph text (scoped to `<article>` when one exists).
pub struct MetaArticleParser;

impl MetaArticleParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetaArticleParser {
    fn default() -> Self {
        Self::new()
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a publish timestamp in the formats providers actually emit.
/// Offsets, when present, are dropped: the result is local wall-clock time.
fn parse_publish_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

/// Find a `datePublished` value anywhere inside an LD-JSON document.
fn ld_json_date(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(s)) = map.get("datePublished") {
                return Some(s.clone());
            }
            map.values().find_map(ld_json_date)
        }
        serde_json::Value::Array(items) => items.iter().find_map(ld_json_date),
        _ => None,
    }
}

fn extract_published(document: &Html) -> Option<NaiveDateTime> {
    if let Some(raw) = meta_content(document, r#"meta[property="article:published_time"]"#) {
        if let Some(dt) = parse_publish_time(&raw) {
            return Some(dt);
        }
    }

    if let Some(raw) = document
        .select(&selector("time[datetime]"))
        .next()
        .and_then(|el| el.value().attr("datetime"))
    {
        if let Some(dt) = parse_publish_time(raw) {
            return Some(dt);
        }
    }

    for script in document.select(&selector(r#"script[type="application/ld+json"]"#)) {
        let text: String = script.text().collect();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            if let Some(raw) = ld_json_date(&value) {
                if let Some(dt) = parse_publish_time(&raw) {
                    return Some(dt);
                }
            }
        }
    }

    None
}

fn extract_title(document: &Html) -> String {
    if let Some(title) = meta_content(document, r#"meta[property="og:title"]"#) {
        return title;
    }
    if let Some(el) = document.select(&selector("title")).next() {
        let text: String = el.text().collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    document
        .select(&selector("h1"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_subtitle(document: &Html) -> String {
    meta_content(document, r#"meta[name="description"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
        .unwrap_or_default()
}

fn extract_body(document: &Html) -> String {
    // Prefer paragraphs inside <article>; fall back to the whole page.
    let scoped = selector("article p");
    let mut paragraphs: Vec<String> = document
        .select(&scoped)
        .map(|p| p.text().collect::<String>())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if paragraphs.is_empty() {
        paragraphs = document
            .select(&selector("p"))
            .map(|p| p.text().collect::<String>())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    paragraphs.join(" ")
}

fn extract_images(document: &Html, page_url: &str) -> (Option<String>, Vec<String>) {
    let base = Url::parse(page_url).ok();
    let mut seen = std::collections::HashSet::new();
    let mut images = Vec::new();

    let mut push = |raw: &str| {
        let resolved = match (&base, Url::parse(raw)) {
            (_, Ok(u)) => Some(u),
            (Some(b), Err(_)) => b.join(raw).ok(),
            (None, Err(_)) => None,
        };
        if let Some(u) = resolved {
            if (u.scheme() == "http" || u.scheme() == "https") && seen.insert(u.to_string()) {
                images.push(u.to_string());
            }
        }
    };

    for el in document.select(&selector(r#"meta[property="og:image"]"#)) {
        if let Some(content) = el.value().attr("content") {
            push(content.trim());
        }
    }
    for el in document.select(&selector("article img[src]")) {
        if let Some(src) = el.value().attr("src") {
            push(src.trim());
        }
    }

    let cover = images.first().cloned();
    (cover, images)
}

impl ArticleParser for MetaArticleParser {
    fn parse(&self, html: &str, url: &str) -> Result<ParsedArticle, DigestError> {
        if html.trim().is_empty() {
            return Err(DigestError::Parse(format!("empty document for {url}")));
        }

        let document = Html::parse_document(html);

        let title = extract_title(&document);
        if title.is_empty() {
            return Err(DigestError::Parse(format!("no title found for {url}")));
        }

        let (cover_image, image_urls) = extract_images(&document, url);

        Ok(ParsedArticle {
            title,
            subtitle: extract_subtitle(&document),
            body: extract_body(&document),
            published: extract_published(&document),
            cover_image,
            image_urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
        <head>
            <title>Fallback Title - Example News</title>
            <meta property="og:title" content="Volcano Erupts Near Capital, Thousands Evacuated" />
            <meta name="description" content="Authorities ordered evacuations after the eruption began overnight." />
            <meta property="article:published_time" content="2026-03-14T06:45:00+11:00" />
            <meta property="og:image" content="https://cdn.example.com/eruption.jpg" />
        </head>
        <body>
            <article>
                <p>Lava reached the outskirts of the city early on Friday.</p>
                <p>Officials said around nine thousand residents were moved to shelters.</p>
                <img src="/media/ash-cloud.jpg" />
            </article>
            <p>Unrelated footer text.</p>
        </body>
        </html>
    "#;

    #[test]
    fn parses_metadata_and_body() {
        let parsed = MetaArticleParser::new()
            .parse(PAGE, "https://www.example.com/news/volcano")
            .unwrap();

        assert_eq!(parsed.title, "Volcano Erupts Near Capital, Thousands Evacuated");
        assert!(parsed.subtitle.starts_with("Authorities ordered"));
        assert!(parsed.body.contains("Lava reached"));
        assert!(parsed.body.contains("nine thousand"));
        assert!(!parsed.body.contains("footer"));
    }

    #[test]
    fn publish_time_keeps_local_wall_clock() {
        let parsed = MetaArticleParser::new()
            .parse(PAGE, "https://www.example.com/news/volcano")
            .unwrap();
        let published = parsed.published.unwrap();
        // +11:00 offset is dropped; the local clock reading stays.
        assert_eq!(published.to_string(), "2026-03-14 06:45:00");
    }

    #[test]
    fn collects_cover_and_article_images() {
        let parsed = MetaArticleParser::new()
            .parse(PAGE, "https://www.example.com/news/volcano")
            .unwrap();
        assert_eq!(
            parsed.cover_image.as_deref(),
            Some("https://cdn.example.com/eruption.jpg")
        );
        assert_eq!(
            parsed.image_urls,
            vec![
                "https://cdn.example.com/eruption.jpg",
                "https://www.example.com/media/ash-cloud.jpg",
            ]
        );
    }

    #[test]
    fn ld_json_date_is_a_fallback() {
        let html = r#"
            <html><head>
                <title>Budget passes</title>
                <script type="application/ld+json">
                    {"@graph": [{"@type": "NewsArticle", "datePublished": "2026-02-01T09:30:00"}]}
                </script>
            </head><body><p>text</p></body></html>
        "#;
        let parsed = MetaArticleParser::new()
            .parse(html, "https://www.example.com/a")
            .unwrap();
        assert_eq!(parsed.published.unwrap().to_string(), "2026-02-01 09:30:00");
    }

    #[test]
    fn missing_title_is_a_parse_error() {
        let err = MetaArticleParser::new()
            .parse("<html><body><p>only text</p></body></html>", "https://x.example/a")
            .unwrap_err();
        assert!(matches!(err, DigestError::Parse(_)));
    }
}
