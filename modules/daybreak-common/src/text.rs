use std::sync::OnceLock;

use regex::Regex;

/// Number of whitespace-separated tokens in a string.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse all runs of whitespace (newlines included) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first `n` whitespace-separated words, re-joined with single spaces.
pub fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

fn sentence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A sentence: anything up to terminal punctuation, plus trailing quotes
    // or brackets that close around it.
    RE.get_or_init(|| Regex::new(r#"[^.!?]*[.!?]+["')\]]*"#).unwrap())
}

/// Split prose into an ordered list of sentences.
///
/// Splits on `.`, `!` and `?` runs; a trailing fragment without terminal
/// punctuation still becomes a sentence. Empty input yields an empty list.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut consumed = 0;

    for m in sentence_regex().find_iter(text) {
        let sentence = m.as_str().trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        consumed = m.end();
    }

    let tail = text[consumed..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_tokens() {
        assert_eq!(word_count("one two  three\n four"), 4);
        assert_eq!(word_count("   "), 0);
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            collapse_whitespace("line one\n\n  line\ttwo "),
            "line one line two"
        );
    }

    #[test]
    fn takes_first_words() {
        assert_eq!(first_words("a b c d e", 3), "a b c");
        assert_eq!(first_words("a b", 10), "a b");
    }

    #[test]
    fn splits_simple_sentences() {
        let sentences = split_sentences("First sentence. Second one! A third?");
        assert_eq!(sentences, vec!["First sentence.", "Second one!", "A third?"]);
    }

    #[test]
    fn keeps_closing_quotes_with_sentence() {
        let sentences = split_sentences(r#"He said "stop." Then he left."#);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], r#"He said "stop.""#);
    }

    #[test]
    fn unterminated_tail_is_a_sentence() {
        let sentences = split_sentences("Complete sentence. And a fragment");
        assert_eq!(sentences, vec!["Complete sentence.", "And a fragment"]);
    }

    #[test]
    fn empty_input_gives_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }
}
