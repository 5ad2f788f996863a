/// URL-path criteria for one provider.
///
/// A candidate passes iff: when a whitelist is defined, at least one of its
/// segments appears in the URL between slashes or before a dot; AND no
/// blacklist segment appears the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderCriteria {
    pub whitelist: &'static [&'static str],
    pub blacklist: &'static [&'static str],
}

/// Static criteria table, keyed by provider name. Providers absent from the
/// table have no path restrictions.
const PROVIDER_CRITERIA: &[(&str, ProviderCriteria)] = &[
    (
        "ABC",
        ProviderCriteria {
            whitelist: &["news"],
            blacklist: &["everyday"],
        },
    ),
    (
        "Al Jazeera",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &["balkans", "liveblog", "sports"],
        },
    ),
    (
        "BBC",
        ProviderCriteria {
            whitelist: &["news"],
            blacklist: &["culture", "live", "reel", "travel", "videos"],
        },
    ),
    (
        "CNN",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &["cars", "entertainment", "sport", "style", "travel"],
        },
    ),
    (
        "Fox News",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &[
                "entertainment",
                "lifestyle",
                "media",
                "personal-finance",
                "sports",
                "travel",
            ],
        },
    ),
    (
        "NPR",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &["podcasts", "sections", "series", "transcripts"],
        },
    ),
    (
        "SBS",
        ProviderCriteria {
            whitelist: &["news"],
            blacklist: &["audio", "food", "sport", "whats-on", "language"],
        },
    ),
    (
        "The Guardian",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &[
                "audio",
                "culture",
                "film",
                "food",
                "football",
                "gnm-press-office",
                "help",
                "lifeandstyle",
                "music",
                "society",
                "sport",
                "tv-and-radio",
                "video",
            ],
        },
    ),
    (
        "The New York Times",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &[
                "arts",
                "athletic",
                "crosswords",
                "espanol",
                "interactive",
                "pageoneplus",
                "podcasts",
                "reviews",
            ],
        },
    ),
    (
        "The Sydney Morning Herald",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &[
                "culture",
                "fashion",
                "goodfood",
                "lifestyle",
                "live-blog",
                "living",
                "property",
                "sport",
                "topic",
                "traveller",
            ],
        },
    ),
    (
        "The Washington Post",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &[
                "advice",
                "books",
                "entertainment",
                "food",
                "lifestyle",
                "obituaries",
                "opinions",
                "podcasts",
                "sports",
                "style",
                "travel",
                "video",
                "wellness",
            ],
        },
    ),
    (
        "9 News",
        ProviderCriteria {
            whitelist: &[],
            blacklist: &["motorsport", "nrl", "olympics"],
        },
    ),
];

/// Criteria for a provider; unknown providers get the empty criteria.
pub fn criteria_for(provider_name: &str) -> ProviderCriteria {
    PROVIDER_CRITERIA
        .iter()
        .find(|(name, _)| *name == provider_name)
        .map(|(_, c)| *c)
        .unwrap_or_default()
}

/// True when `segment` appears in `url` delimited as a path piece:
/// `/segment/` or `/segment.`.
fn segment_matches(url: &str, segment: &str) -> bool {
    url.contains(&format!("/{segment}/")) || url.contains(&format!("/{segment}."))
}

/// The §4.2 predicate. Pure and total over any URL string.
pub fn passes_criteria(url: &str, criteria: ProviderCriteria) -> bool {
    if !criteria.whitelist.is_empty()
        && !criteria.whitelist.iter().any(|w| segment_matches(url, w))
    {
        return false;
    }
    !criteria.blacklist.iter().any(|b| segment_matches(url, b))
}

/// Convenience wrapper looking the provider up in the static table.
pub fn passes_provider_filter(provider_name: &str, url: &str) -> bool {
    passes_criteria(url, criteria_for(provider_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklisted_section_is_rejected() {
        assert!(!passes_provider_filter(
            "The Guardian",
            "https://www.theguardian.com/sport/2026/jan/10/final"
        ));
        assert!(passes_provider_filter(
            "The Guardian",
            "https://www.theguardian.com/world/2026/jan/10/summit"
        ));
    }

    #[test]
    fn blacklist_matches_before_dots_too() {
        assert!(!passes_provider_filter(
            "NPR",
            "https://www.npr.org/podcasts.html"
        ));
    }

    #[test]
    fn whitelist_requires_a_match() {
        assert!(passes_provider_filter(
            "BBC",
            "https://www.bbc.com/news/world-europe-123"
        ));
        assert!(!passes_provider_filter(
            "BBC",
            "https://www.bbc.com/sport/football-456"
        ));
    }

    #[test]
    fn whitelist_and_blacklist_compose() {
        // Whitelisted section but blacklisted sub-path still fails.
        assert!(!passes_provider_filter(
            "BBC",
            "https://www.bbc.com/news/live/world-123"
        ));
    }

    #[test]
    fn unknown_provider_passes_everything() {
        assert!(passes_provider_filter(
            "Unknown Gazette",
            "https://gazette.example/sport/anything"
        ));
    }

    #[test]
    fn substring_without_delimiters_does_not_match() {
        // "sport" appears inside "transport" but not as a path segment.
        assert!(passes_provider_filter(
            "CNN",
            "https://edition.cnn.com/transport-news/item"
        ));
    }
}
