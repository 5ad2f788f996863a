use chrono::{DateTime, Duration, Utc};

use daybreak_common::text::word_count;

use crate::filter::passes_provider_filter;

/// Minimum whitespace tokens a usable title carries.
pub const MIN_TITLE_WORDS: usize = 6;
/// Minimum whitespace tokens a usable body carries.
pub const MIN_BODY_WORDS: usize = 18;
/// Articles older than this at collection time are stale.
pub const MAX_ARTICLE_AGE_DAYS: i64 = 3;

/// Why an otherwise-parsed article was dropped. Rejections are silent per
/// article; the collector only counts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoPublishDate,
    Stale,
    FutureDated,
    TitleTooShort,
    BodyTooShort,
    FilteredUrl,
}

/// Post-parse admission check for one article.
///
/// `ts` is the already-normalised UTC publish time (None when the page had
/// no usable date); `url` is the final canonical URL.
pub fn validate_article(
    provider_name: &str,
    url: &str,
    title: &str,
    body: &str,
    ts: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), RejectReason> {
    let ts = ts.ok_or(RejectReason::NoPublishDate)?;
    if ts > now {
        return Err(RejectReason::FutureDated);
    }
    if ts < now - Duration::days(MAX_ARTICLE_AGE_DAYS) {
        return Err(RejectReason::Stale);
    }
    if word_count(title) < MIN_TITLE_WORDS {
        return Err(RejectReason::TitleTooShort);
    }
    if word_count(body) < MIN_BODY_WORDS {
        return Err(RejectReason::BodyTooShort);
    }
    if !passes_provider_filter(provider_name, url) {
        return Err(RejectReason::FilteredUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: &str = "Parliament passes long-awaited housing reform bill";
    const BODY: &str = "The bill passed with a narrow majority after months of negotiation \
        between the major parties and the crossbench, delivering new funding.";

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn accepts_a_fresh_valid_article() {
        let ts = Some(now() - Duration::hours(6));
        assert!(validate_article("CNN", "https://cnn.example/world/x", TITLE, BODY, ts, now()).is_ok());
    }

    #[test]
    fn rejects_missing_publish_date() {
        assert_eq!(
            validate_article("CNN", "https://cnn.example/world/x", TITLE, BODY, None, now()),
            Err(RejectReason::NoPublishDate)
        );
    }

    #[test]
    fn rejects_stale_and_future_timestamps() {
        let stale = Some(now() - Duration::days(4));
        assert_eq!(
            validate_article("CNN", "https://cnn.example/world/x", TITLE, BODY, stale, now()),
            Err(RejectReason::Stale)
        );
        let future = Some(now() + Duration::hours(2));
        assert_eq!(
            validate_article("CNN", "https://cnn.example/world/x", TITLE, BODY, future, now()),
            Err(RejectReason::FutureDated)
        );
    }

    #[test]
    fn rejects_short_title_and_body() {
        let ts = Some(now() - Duration::hours(1));
        assert_eq!(
            validate_article("CNN", "https://cnn.example/world/x", "Too short", BODY, ts, now()),
            Err(RejectReason::TitleTooShort)
        );
        assert_eq!(
            validate_article("CNN", "https://cnn.example/world/x", TITLE, "tiny body", ts, now()),
            Err(RejectReason::BodyTooShort)
        );
    }

    #[test]
    fn rejects_filtered_final_url() {
        let ts = Some(now() - Duration::hours(1));
        assert_eq!(
            validate_article("CNN", "https://cnn.example/sport/final", TITLE, BODY, ts, now()),
            Err(RejectReason::FilteredUrl)
        );
    }
}
