use rust_stemmers::{Algorithm, Stemmer};

/// English stopwords dropped during keyword sanitisation.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "against", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "between", "both", "but", "by", "can", "did", "do",
    "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has",
    "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "our", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "you", "your", "yours",
];

/// Normalise a raw keyword for storage: lowercase, strip everything outside
/// `[a-z0-9 -]`, drop stopwords, stem the remaining words.
///
/// Returns `None` when nothing survives (the caller skips the keyword).
pub fn sanitize_keyword(raw: &str) -> Option<String> {
    let stemmer = Stemmer::create(Algorithm::English);

    let lowered = raw.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();

    let stemmed: Vec<String> = cleaned
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .map(|word| stemmer.stem(word).into_owned())
        .collect();

    if stemmed.is_empty() {
        return None;
    }
    Some(stemmed.join(" "))
}
