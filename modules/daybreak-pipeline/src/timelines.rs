use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};

use daybreak_cluster::{accept_timeline, is_super_story, DensityClusterer, MIN_CLUSTER_SIZE};
use daybreak_common::{sanitize_keyword, DatePrecision, DigestError};
use daybreak_store::{NewTimeline, NewTimelineEvent, Store, StoryRow};

use crate::summarise::Summariser;

/// Stories published inside this window feed timeline clustering.
const STORY_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Default)]
pub struct TimelineStats {
    pub stories: usize,
    pub super_stories: usize,
    pub timelines_written: usize,
    pub timelines_rejected: usize,
}

impl std::fmt::Display for TimelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Timeline Generation Complete ===")?;
        writeln!(f, "Stories clustered:  {}", self.stories)?;
        writeln!(f, "Super-stories:      {}", self.super_stories)?;
        writeln!(f, "Timelines written:  {}", self.timelines_written)?;
        writeln!(f, "Timelines rejected: {}", self.timelines_rejected)?;
        Ok(())
    }
}

/// Parse a `YYYY[-MM[-DD]]` event date into a calendar date and its
/// precision tag. Partial dates snap to the first day of the period.
pub fn parse_event_date(raw: &str) -> Option<(NaiveDate, DatePrecision)> {
    let precision = DatePrecision::of_date_str(raw)?;
    let padded = match precision {
        DatePrecision::Day => raw.to_string(),
        DatePrecision::Month => format!("{raw}-01"),
        DatePrecision::Year => format!("{raw}-01-01"),
    };
    let date = NaiveDate::parse_from_str(&padded, "%Y-%m-%d").ok()?;
    Some((date, precision))
}

/// Re-clusters recent stories into super-stories and extracts dated event
/// timelines for the ones still moving.
pub struct TimelineBuilder {
    store: Store,
    summariser: Summariser,
}

impl TimelineBuilder {
    pub fn new(store: Store, summariser: Summariser) -> Self {
        Self { store, summariser }
    }

    pub async fn run(&self, digest_id: i64) -> Result<TimelineStats, DigestError> {
        let now = Utc::now();
        let since = now - Duration::days(STORY_WINDOW_DAYS);

        let embedded = self.store.embedded_stories_since(since).await?;
        let vectors: Vec<Vec<f32>> = embedded.iter().map(|(_, v)| v.clone()).collect();
        let labels = DensityClusterer::new(MIN_CLUSTER_SIZE).fit(&vectors);

        let mut clusters: HashMap<usize, Vec<&StoryRow>> = HashMap::new();
        for ((story, _), label) in embedded.iter().zip(&labels) {
            if let Some(label) = label {
                clusters.entry(*label).or_default().push(story);
            }
        }

        let mut super_stories: Vec<Vec<&StoryRow>> = Vec::new();
        let mut ordered: Vec<(usize, Vec<&StoryRow>)> = clusters.into_iter().collect();
        ordered.sort_by_key(|(label, _)| *label);
        for (_, stories) in ordered {
            let timestamps: Vec<DateTime<Utc>> = stories.iter().map(|s| s.ts).collect();
            if is_super_story(stories.len(), &timestamps, now) {
                super_stories.push(stories);
            }
        }

        let mut stats = TimelineStats {
            stories: embedded.len(),
            super_stories: super_stories.len(),
            ..Default::default()
        };

        for mut stories in super_stories {
            stories.sort_by_key(|s| s.ts);
            let owned: Vec<StoryRow> = stories.iter().map(|s| (*s).clone()).collect();

            let draft = self.summariser.timeline(&owned).await?;

            // The summariser already enforced the date grammar; parse to
            // calendar dates and apply the acceptance criteria.
            let mut events: Vec<NewTimelineEvent> = Vec::new();
            for event in &draft.timeline_events {
                let Some((date, precision)) = parse_event_date(&event.date) else {
                    continue;
                };
                events.push(NewTimelineEvent {
                    story_id: event.story_reference,
                    description: event.event_description.clone(),
                    date,
                    date_type: precision,
                });
            }

            let event_dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
            if !accept_timeline(&event_dates, now) {
                info!(subject = %draft.subject, events = events.len(), "Timeline rejected");
                stats.timelines_rejected += 1;
                continue;
            }

            let timeline_id = self
                .store
                .insert_timeline(&NewTimeline {
                    ts: now,
                    digest_id,
                    subject: draft.subject.clone(),
                    headline: draft.headline.clone(),
                    summary: draft.summary.clone(),
                })
                .await?;

            for event in &events {
                self.store.insert_timeline_event(timeline_id, event).await?;
            }
            for story in &owned {
                self.store.link_timeline_story(timeline_id, story.id).await?;
            }
            for entry in &draft.keywords {
                let Some(cleaned) = sanitize_keyword(&entry.keyword) else {
                    continue;
                };
                let keyword_id = self
                    .store
                    .upsert_keyword(&cleaned, entry.keyword_type)
                    .await?;
                self.store
                    .link_timeline_keyword(timeline_id, keyword_id)
                    .await?;
            }

            info!(
                timeline_id,
                subject = %draft.subject,
                events = events.len(),
                stories = owned.len(),
                "Timeline written"
            );
            stats.timelines_written += 1;
        }

        if stats.super_stories == 0 {
            warn!("No story cluster met the super-story criterion");
        }
        info!(
            super_stories = stats.super_stories,
            written = stats.timelines_written,
            rejected = stats.timelines_rejected,
            "Timeline generation complete"
        );
        Ok(stats)
    }
}
