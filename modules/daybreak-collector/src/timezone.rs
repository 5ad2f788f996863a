use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Fallback zones when a provider's timezone string is unusable.
const COUNTRY_DEFAULTS: &[(&str, Tz)] = &[
    ("AU", chrono_tz::Australia::Sydney),
    ("US", chrono_tz::America::New_York),
    ("UK", chrono_tz::Europe::London),
    ("QA", chrono_tz::Asia::Qatar),
];

fn resolve_zone(timezone: &str, country: &str) -> Tz {
    if let Ok(tz) = timezone.parse::<Tz>() {
        return tz;
    }
    COUNTRY_DEFAULTS
        .iter()
        .find(|(c, _)| *c == country)
        .map(|(_, tz)| *tz)
        .unwrap_or(chrono_tz::UTC)
}

/// Normalise a provider-local publish time to UTC.
///
/// A wall-clock reading of exactly midnight means the page only carried a
/// date; it is treated as noon local before conversion. Ambiguous or
/// non-existent local times (DST transitions) resolve to the earlier
/// candidate, or shift forward an hour when the reading was skipped.
pub fn normalise_publish_time(local: NaiveDateTime, timezone: &str, country: &str) -> DateTime<Utc> {
    let zone = resolve_zone(timezone, country);

    let midnight = NaiveTime::from_hms_opt(0, 0, 0).expect("static time");
    let noon = NaiveTime::from_hms_opt(12, 0, 0).expect("static time");
    let local = if local.time() == midnight {
        local.date().and_time(noon)
    } else {
        local
    };

    match zone.from_local_datetime(&local).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            let shifted = local + chrono::Duration::hours(1);
            zone.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn converts_local_to_utc() {
        // Brisbane is UTC+10 year-round.
        let utc = normalise_publish_time(local(2026, 3, 14, 15, 30), "Australia/Brisbane", "AU");
        assert_eq!(utc.to_rfc3339(), "2026-03-14T05:30:00+00:00");
    }

    #[test]
    fn midnight_becomes_noon_local() {
        // Midnight in UTC+10 is read as noon local, i.e. 02:00Z that day.
        let utc = normalise_publish_time(local(2026, 3, 14, 0, 0), "Australia/Brisbane", "AU");
        assert_eq!(utc.to_rfc3339(), "2026-03-14T02:00:00+00:00");
    }

    #[test]
    fn one_past_midnight_is_not_shifted() {
        let utc = normalise_publish_time(local(2026, 3, 14, 0, 1), "Australia/Brisbane", "AU");
        assert_eq!(utc.to_rfc3339(), "2026-03-13T14:01:00+00:00");
    }

    #[test]
    fn unknown_zone_falls_back_to_country_default() {
        // January: London is on GMT, so local == UTC.
        let utc = normalise_publish_time(local(2026, 1, 10, 9, 0), "not-a-zone", "UK");
        assert_eq!(utc.to_rfc3339(), "2026-01-10T09:00:00+00:00");
    }

    #[test]
    fn unknown_zone_and_country_assume_utc() {
        let utc = normalise_publish_time(local(2026, 1, 10, 9, 0), "", "NZ");
        assert_eq!(utc.to_rfc3339(), "2026-01-10T09:00:00+00:00");
    }
}
