use std::sync::Arc;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use ai_client::traits::{Decoding, StructuredAgent};
use ai_client::StructuredOutput;
use daybreak_common::text::first_words;
use daybreak_common::{DigestError, KeywordType};
use daybreak_store::StoryRow;

/// Attempts per call: the first plus two retries.
const MAX_ATTEMPTS: u32 = 3;
/// Body words sent per article in a story prompt.
const BODY_WORDS_PER_ARTICLE: usize = 200;

fn event_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}(-\d{2})?(-\d{2})?$").unwrap())
}

// =============================================================================
// Response shapes
// =============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct KeywordEntry {
    /// A named entity related to the story.
    pub keyword: String,
    #[serde(rename = "type")]
    pub keyword_type: KeywordType,
}

/// Headline, summaries and keywords for one story.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StoryDigest {
    /// Up to 15 words to headline the story based on the articles.
    pub headline: String,
    /// Up to 150 words to summarise the story based on the articles.
    pub story_summary: String,
    /// Up to 100 words to describe the ways the different articles told the story.
    pub coverage_summary: String,
    /// Up to 10 named entities related to the story.
    pub keywords: Vec<KeywordEntry>,
}

/// Category-keyed digest rundowns. All keys are required.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RundownSet {
    /// Up to 200 words summarising the most important stories of the day.
    #[serde(rename = "Daily News")]
    pub daily_news: String,
    /// Up to 200 words summarising the most important Australian stories.
    #[serde(rename = "Australian News")]
    pub australian_news: String,
    /// Up to 200 words summarising the most important American stories.
    #[serde(rename = "US News")]
    pub us_news: String,
}

impl RundownSet {
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("Daily News", self.daily_news.as_str()),
            ("Australian News", self.australian_news.as_str()),
            ("US News", self.us_news.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimelineEventDraft {
    /// Date of the event in YYYY, YYYY-MM or YYYY-MM-DD format.
    pub date: String,
    /// Description of the event in a single sentence up to 10 words.
    pub event_description: String,
    /// ID of a story that describes the event.
    pub story_reference: i64,
}

/// Subject, headline, summary and dated events for a super-story.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimelineDraft {
    /// 2 to 5 words describing the specific story and its category.
    pub subject: String,
    /// Up to 15 words to headline the story.
    pub headline: String,
    /// Up to 250 words to summarise the story.
    pub summary: String,
    /// The events making up the timeline.
    pub timeline_events: Vec<TimelineEventDraft>,
    /// Up to 10 named entities relating to the story.
    pub keywords: Vec<KeywordEntry>,
}

/// One article rendered into a story prompt.
#[derive(Debug, Clone)]
pub struct ArticlePayload {
    pub provider: String,
    pub ts: DateTime<Utc>,
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

// =============================================================================
// Summariser
// =============================================================================

/// Schema-constrained chat calls with bounded retry.
///
/// The model is an unreliable collaborator: every response is parsed and
/// validated here, and callers never see a malformed object. Parse or
/// validation failures retry up to two more times before the stage-fatal
/// `SummariserError`.
pub struct Summariser {
    agent: Arc<dyn StructuredAgent>,
}

impl Summariser {
    pub fn new(agent: Arc<dyn StructuredAgent>) -> Self {
        Self { agent }
    }

    async fn call_validated<T, V>(
        &self,
        schema_name: &str,
        system: &str,
        user: &str,
        validate: V,
    ) -> Result<T, DigestError>
    where
        T: StructuredOutput,
        V: Fn(&T) -> Result<(), String>,
    {
        let schema = T::response_schema();
        let mut last_cause = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            // Transport failures propagate untouched: the retry budget only
            // covers the model returning malformed or incomplete objects.
            let raw = self
                .agent
                .structured(schema_name, schema.clone(), system, user, Decoding::default())
                .await?;

            match serde_json::from_str::<T>(&raw) {
                Ok(value) => match validate(&value) {
                    Ok(()) => return Ok(value),
                    Err(cause) => {
                        last_cause = cause;
                        warn!(schema_name, attempt, cause = %last_cause, "Summariser response invalid");
                    }
                },
                Err(e) => {
                    last_cause = format!("malformed JSON: {e}");
                    warn!(schema_name, attempt, cause = %last_cause, "Summariser response unparseable");
                }
            }
        }

        Err(DigestError::Summariser {
            attempts: MAX_ATTEMPTS,
            cause: last_cause,
        })
    }

    /// Story digest for one cluster of articles, newest first.
    pub async fn story_digest(
        &self,
        articles: &[ArticlePayload],
    ) -> Result<StoryDigest, DigestError> {
        let system = "You take in headlines and article text from a collection of articles \
            about a news story. You need to provide a headline, story summary, coverage summary \
            and keywords for the story. The headline should be up to 15 words, the story summary \
            up to 150 words, the coverage summary up to 100 words, and up to 10 keywords. \
            The headline should be a brief, attention-grabbing title for the story. \
            The story summary should be a concise overview of the story, including the most \
            important information. The coverage summary should compare and contrast the way the \
            story is told between the articles. The keywords should be names, places, events and \
            institutions related to the story.";

        let rendered: Vec<String> = articles
            .iter()
            .map(|a| {
                format!(
                    "{}\t{}\n{}\n{}\n{}",
                    a.provider,
                    a.ts.format("%Y-%m-%d"),
                    a.title,
                    a.subtitle,
                    first_words(&a.body, BODY_WORDS_PER_ARTICLE),
                )
            })
            .collect();
        let user = format!(
            "Here are the headlines and summaries of the articles about the story:\n\n{}",
            rendered.join("\n\n")
        );

        self.call_validated("story_digest", system, &user, validate_story_digest)
            .await
    }

    /// Category rundowns over every story in the digest.
    pub async fn rundowns(&self, stories: &[StoryRow]) -> Result<RundownSet, DigestError> {
        let system = "You take in text from todays news stories and generate rundowns based on \
            given themes: Daily News, Australian News and US News. Each rundown is up to 200 \
            words summarising the most important stories and information for its theme.";

        let user: String = stories
            .iter()
            .map(|s| format!("{}\n{}\n", s.title, s.summary))
            .collect::<Vec<_>>()
            .join("\n");

        self.call_validated("digest_rundowns", system, &user, validate_rundowns)
            .await
    }

    /// Timeline for one super-story; `stories` must be sorted ascending by
    /// timestamp.
    pub async fn timeline(&self, stories: &[StoryRow]) -> Result<TimelineDraft, DigestError> {
        let system = "You read several related news stories, published across many days or \
            weeks. From the information contained in the stories you will write a subject line, \
            headline, story summary and keywords, and then extract important events to build a \
            timeline. The subject should describe the specific story and its category. The \
            headline should be a newspaper-style attention-grabbing title for the story. The \
            story summary should be a concise overview of the story. Include the most important \
            information, and specify dates of specific events. The timeline should be a list of \
            events, each with a date, description and story reference. Each description should \
            be a single short sentence, the date should be in YYYY-MM-DD format, and the story \
            reference is an ID of a story that describes the event.";

        let rendered: Vec<String> = stories
            .iter()
            .map(|s| {
                format!(
                    "{}\tID:{}\t{}\n{}",
                    s.ts.format("%Y-%m-%d"),
                    s.id,
                    s.title,
                    s.summary
                )
            })
            .collect();
        let user = format!(
            "Here are the headlines and summaries of the stories:\n{}",
            rendered.join("\n")
        );

        self.call_validated("super_story_timeline", system, &user, validate_timeline)
            .await
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_story_digest(digest: &StoryDigest) -> Result<(), String> {
    if digest.headline.trim().is_empty() {
        return Err("empty headline".to_string());
    }
    if digest.story_summary.trim().is_empty() {
        return Err("empty story_summary".to_string());
    }
    if digest.coverage_summary.trim().is_empty() {
        return Err("empty coverage_summary".to_string());
    }
    if digest.keywords.is_empty() {
        return Err("no keywords".to_string());
    }
    Ok(())
}

fn validate_rundowns(rundowns: &RundownSet) -> Result<(), String> {
    for (category, text) in rundowns.entries() {
        if text.trim().is_empty() {
            return Err(format!("empty rundown for {category}"));
        }
    }
    Ok(())
}

fn validate_timeline(draft: &TimelineDraft) -> Result<(), String> {
    if draft.subject.trim().is_empty() {
        return Err("empty subject".to_string());
    }
    if draft.headline.trim().is_empty() {
        return Err("empty headline".to_string());
    }
    if draft.summary.trim().is_empty() {
        return Err("empty summary".to_string());
    }
    if draft.timeline_events.is_empty() {
        return Err("no timeline events".to_string());
    }
    if draft.keywords.is_empty() {
        return Err("no keywords".to_string());
    }
    for event in &draft.timeline_events {
        if event.event_description.trim().is_empty() {
            return Err("empty event description".to_string());
        }
        if !event_date_regex().is_match(&event.date) {
            return Err(format!("bad event date '{}'", event.date));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Agent returning a scripted sequence of responses.
    struct ScriptedAgent {
        responses: Mutex<Vec<anyhow::Result<String>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedAgent {
        fn new(responses: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl StructuredAgent for ScriptedAgent {
        async fn structured(
            &self,
            _schema_name: &str,
            _schema: serde_json::Value,
            _system: &str,
            _user: &str,
            _decoding: Decoding,
        ) -> anyhow::Result<String> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(anyhow!("script exhausted"));
            }
            responses.remove(0)
        }
    }

    fn good_story_json() -> String {
        serde_json::json!({
            "headline": "Floodwaters Recede As Cleanup Begins",
            "story_summary": "Residents returned home on Tuesday.",
            "coverage_summary": "Outlets differed on the damage estimates.",
            "keywords": [{"keyword": "Queensland", "type": "PLACE"}]
        })
        .to_string()
    }

    fn payload() -> Vec<ArticlePayload> {
        vec![ArticlePayload {
            provider: "ABC".to_string(),
            ts: Utc::now(),
            title: "Flood cleanup begins across the state".to_string(),
            subtitle: "Thousands return home".to_string(),
            body: "word ".repeat(300),
        }]
    }

    #[tokio::test]
    async fn story_digest_parses_a_valid_response() {
        let agent = ScriptedAgent::new(vec![Ok(good_story_json())]);
        let summariser = Summariser::new(agent.clone());

        let digest = summariser.story_digest(&payload()).await.unwrap();
        assert_eq!(digest.keywords[0].keyword_type, KeywordType::Place);
        assert_eq!(agent.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_responses_retry_then_fail() {
        let agent = ScriptedAgent::new(vec![
            Ok("not json at all".to_string()),
            Ok("{\"headline\": 42}".to_string()),
            Ok("{}".to_string()),
        ]);
        let summariser = Summariser::new(agent.clone());

        let err = summariser.story_digest(&payload()).await.unwrap_err();
        match err {
            DigestError::Summariser { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(agent.calls(), 3);
    }

    #[tokio::test]
    async fn second_attempt_can_recover() {
        let agent = ScriptedAgent::new(vec![
            Ok("oops".to_string()),
            Ok(good_story_json()),
        ]);
        let summariser = Summariser::new(agent.clone());

        assert!(summariser.story_digest(&payload()).await.is_ok());
        assert_eq!(agent.calls(), 2);
    }

    #[tokio::test]
    async fn empty_required_field_is_invalid() {
        let empty_headline = serde_json::json!({
            "headline": "  ",
            "story_summary": "s",
            "coverage_summary": "c",
            "keywords": [{"keyword": "k", "type": "OTHER"}]
        })
        .to_string();
        let agent = ScriptedAgent::new(vec![
            Ok(empty_headline.clone()),
            Ok(empty_headline.clone()),
            Ok(empty_headline),
        ]);
        let summariser = Summariser::new(agent);

        let err = summariser.story_digest(&payload()).await.unwrap_err();
        assert!(matches!(err, DigestError::Summariser { .. }));
    }

    fn story_row(id: i64) -> StoryRow {
        StoryRow {
            id,
            ts: Utc::now(),
            digest_id: 0,
            digest_description: "20260314-0".to_string(),
            title: "A developing situation".to_string(),
            summary: "Things happened.".to_string(),
            coverage: "Coverage varied.".to_string(),
        }
    }

    #[tokio::test]
    async fn timeline_rejects_bad_date_grammar_then_accepts_fixed() {
        let bad = serde_json::json!({
            "subject": "Port strike",
            "headline": "Dock Workers Walk Out",
            "summary": "A summary.",
            "timeline_events": [
                {"date": "14/03/2026", "event_description": "Strike begins", "story_reference": 1}
            ],
            "keywords": [{"keyword": "union", "type": "INSTITUTION"}]
        })
        .to_string();
        let good = serde_json::json!({
            "subject": "Port strike",
            "headline": "Dock Workers Walk Out",
            "summary": "A summary.",
            "timeline_events": [
                {"date": "2026-03-14", "event_description": "Strike begins", "story_reference": 1},
                {"date": "2026-03", "event_description": "Talks stall", "story_reference": 2}
            ],
            "keywords": [{"keyword": "union", "type": "INSTITUTION"}]
        })
        .to_string();

        let agent = ScriptedAgent::new(vec![Ok(bad), Ok(good)]);
        let summariser = Summariser::new(agent.clone());

        let draft = summariser.timeline(&[story_row(1), story_row(2)]).await.unwrap();
        assert_eq!(draft.timeline_events.len(), 2);
        assert_eq!(agent.calls(), 2);
    }

    #[tokio::test]
    async fn rundowns_require_every_category() {
        let missing = serde_json::json!({
            "Daily News": "All the news.",
            "Australian News": "",
            "US News": "US news."
        })
        .to_string();
        let complete = serde_json::json!({
            "Daily News": "All the news.",
            "Australian News": "Australian news.",
            "US News": "US news."
        })
        .to_string();

        let agent = ScriptedAgent::new(vec![Ok(missing), Ok(complete)]);
        let summariser = Summariser::new(agent.clone());

        let rundowns = summariser.rundowns(&[story_row(1)]).await.unwrap();
        assert_eq!(rundowns.entries()[1].1, "Australian news.");
        assert_eq!(agent.calls(), 2);
    }

    #[test]
    fn schemas_are_strict_objects() {
        for schema in [
            StoryDigest::response_schema(),
            RundownSet::response_schema(),
            TimelineDraft::response_schema(),
        ] {
            let text = serde_json::to_string(&schema).unwrap();
            assert!(text.contains("\"additionalProperties\":false"));
            assert!(!text.contains("$ref"));
        }
    }
}
