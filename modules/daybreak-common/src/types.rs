use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a digest. Stages advance a digest strictly forward
/// through these states; READY digests are the only ones the read API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DigestState {
    Created,
    ArticlesCollected,
    ArticlesEmbedded,
    StoriesGenerated,
    StoriesEmbedded,
    ImagesCollected,
    RundownsGenerated,
    Ready,
}

impl std::fmt::Display for DigestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DigestState::Created => "CREATED",
            DigestState::ArticlesCollected => "ARTICLES_COLLECTED",
            DigestState::ArticlesEmbedded => "ARTICLES_EMBEDDED",
            DigestState::StoriesGenerated => "STORIES_GENERATED",
            DigestState::StoriesEmbedded => "STORIES_EMBEDDED",
            DigestState::ImagesCollected => "IMAGES_COLLECTED",
            DigestState::RundownsGenerated => "RUNDOWNS_GENERATED",
            DigestState::Ready => "READY",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DigestState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "ARTICLES_COLLECTED" => Ok(Self::ArticlesCollected),
            "ARTICLES_EMBEDDED" => Ok(Self::ArticlesEmbedded),
            "STORIES_GENERATED" => Ok(Self::StoriesGenerated),
            "STORIES_EMBEDDED" => Ok(Self::StoriesEmbedded),
            "IMAGES_COLLECTED" => Ok(Self::ImagesCollected),
            "RUNDOWNS_GENERATED" => Ok(Self::RundownsGenerated),
            "READY" => Ok(Self::Ready),
            other => Err(format!("unknown DigestState: {other}")),
        }
    }
}

/// Named-entity class of a keyword. `(text, type)` is unique store-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeywordType {
    Person,
    Place,
    Event,
    Institution,
    Concept,
    Other,
}

impl std::fmt::Display for KeywordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KeywordType::Person => "PERSON",
            KeywordType::Place => "PLACE",
            KeywordType::Event => "EVENT",
            KeywordType::Institution => "INSTITUTION",
            KeywordType::Concept => "CONCEPT",
            KeywordType::Other => "OTHER",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for KeywordType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSON" => Ok(Self::Person),
            "PLACE" => Ok(Self::Place),
            "EVENT" => Ok(Self::Event),
            "INSTITUTION" => Ok(Self::Institution),
            "CONCEPT" => Ok(Self::Concept),
            "OTHER" => Ok(Self::Other),
            other => Err(format!("unknown KeywordType: {other}")),
        }
    }
}

/// How precise a timeline-event date is, derived from the length of the
/// `YYYY[-MM[-DD]]` string the model returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePrecision {
    Day,
    Month,
    Year,
}

impl DatePrecision {
    /// Classify a date string of the restricted grammar by its length.
    pub fn of_date_str(date: &str) -> Option<Self> {
        match date.len() {
            10 => Some(Self::Day),
            7 => Some(Self::Month),
            4 => Some(Self::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatePrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DatePrecision::Day => "D",
            DatePrecision::Month => "M",
            DatePrecision::Year => "Y",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DatePrecision {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(Self::Day),
            "M" => Ok(Self::Month),
            "Y" => Ok(Self::Year),
            other => Err(format!("unknown DatePrecision: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn digest_state_round_trips_through_text() {
        let states = [
            DigestState::Created,
            DigestState::ArticlesCollected,
            DigestState::ArticlesEmbedded,
            DigestState::StoriesGenerated,
            DigestState::StoriesEmbedded,
            DigestState::ImagesCollected,
            DigestState::RundownsGenerated,
            DigestState::Ready,
        ];
        for state in states {
            assert_eq!(DigestState::from_str(&state.to_string()), Ok(state));
        }
    }

    #[test]
    fn unknown_state_is_rejected() {
        assert!(DigestState::from_str("DONE").is_err());
    }

    #[test]
    fn keyword_type_serde_uses_uppercase() {
        let json = serde_json::to_string(&KeywordType::Institution).unwrap();
        assert_eq!(json, "\"INSTITUTION\"");
        let back: KeywordType = serde_json::from_str("\"PLACE\"").unwrap();
        assert_eq!(back, KeywordType::Place);
    }

    #[test]
    fn date_precision_from_string_length() {
        assert_eq!(DatePrecision::of_date_str("2026-03-14"), Some(DatePrecision::Day));
        assert_eq!(DatePrecision::of_date_str("2026-03"), Some(DatePrecision::Month));
        assert_eq!(DatePrecision::of_date_str("2026"), Some(DatePrecision::Year));
        assert_eq!(DatePrecision::of_date_str("14/03/2026"), None);
    }
}
