use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Minimum cluster size shared by the article and story clusterers.
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Story admission: a cluster of articles becomes a story only with broad
/// enough coverage. Five providers always qualify; fewer qualify when the
/// coverage is geographically concentrated.
pub fn story_admission(n_providers: usize, n_countries: usize) -> bool {
    n_providers >= 5
        || (n_countries == 1 && n_providers >= 3)
        || (n_countries == 2 && n_providers >= 4)
}

/// Super-story criterion: a cluster of stories is worth a timeline when it
/// is big, spans several days, and is still moving.
pub fn is_super_story(
    n_stories: usize,
    story_timestamps: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> bool {
    let n_days = story_timestamps
        .iter()
        .map(|ts| ts.date_naive())
        .collect::<std::collections::HashSet<_>>()
        .len();
    let most_recent = match story_timestamps.iter().max() {
        Some(ts) => *ts,
        None => return false,
    };

    n_stories >= 6 && n_days >= 4 && most_recent > now - Duration::hours(24)
}

/// Timeline acceptance, applied to the event list the model produced:
/// at least 3 events, spanning at least 2 days, with the latest event newer
/// than 36 hours.
pub fn accept_timeline(event_dates: &[NaiveDate], now: DateTime<Utc>) -> bool {
    if event_dates.len() < 3 {
        return false;
    }
    let earliest = match event_dates.iter().min() {
        Some(d) => *d,
        None => return false,
    };
    let latest = match event_dates.iter().max() {
        Some(d) => *d,
        None => return false,
    };

    if (latest - earliest).num_days() < 2 {
        return false;
    }
    latest >= (now - Duration::hours(36)).date_naive()
}
