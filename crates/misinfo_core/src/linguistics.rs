//! crates/misinfo_core/src/linguistics.rs
//!
//! A small, deterministic lexical pass producing the deep-analysis scores.

use crate::domain::LinguisticFeatures;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "improve", "improved", "success", "benefit", "strong", "growth",
    "safe", "hope", "win", "positive", "progress", "sunny", "breakthrough",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "danger", "dangerous", "crisis", "fear", "death", "scandal",
    "fraud", "lie", "lies", "threat", "collapse", "disaster", "hate", "corrupt",
];

const INFORMAL_MARKERS: &[&str] = &[
    "gonna", "wanna", "lol", "omg", "wow", "trick", "guys", "stuff", "crazy",
];

/// Scores a text on sentiment, readability, formality, and complexity.
///
/// Empty or whitespace-only text scores neutral across the board.
pub fn analyze(text: &str) -> LinguisticFeatures {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return LinguisticFeatures {
            sentiment_score: 0.0,
            readability_score: 0.5,
            formality_score: 0.5,
            complexity_score: 0.5,
        };
    }

    let positive = words
        .iter()
        .filter(|w| POSITIVE_WORDS.contains(&w.as_str()))
        .count() as f64;
    let negative = words
        .iter()
        .filter(|w| NEGATIVE_WORDS.contains(&w.as_str()))
        .count() as f64;
    let sentiment_score = if positive + negative == 0.0 {
        0.0
    } else {
        (positive - negative) / (positive + negative)
    };

    let sentences = text
        .split(|c: char| c == '.' || c == '!' || c == '?')
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1) as f64;
    let words_per_sentence = words.len() as f64 / sentences;
    // 10 words per sentence reads easily, 40 is hard going.
    let readability_score = clamp01(1.0 - (words_per_sentence - 10.0) / 30.0);

    let exclamations = text.matches('!').count() as f64;
    let contractions = words.iter().filter(|w| w.contains('\'')).count() as f64;
    let informal = words
        .iter()
        .filter(|w| INFORMAL_MARKERS.contains(&w.as_str()))
        .count() as f64;
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    let uppercase_ratio = if letters.is_empty() {
        0.0
    } else {
        letters.iter().filter(|c| c.is_uppercase()).count() as f64 / letters.len() as f64
    };
    let informality = (exclamations + contractions + informal) / words.len() as f64;
    let formality_score = clamp01(1.0 - informality * 4.0 - uppercase_ratio);

    let avg_word_len =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64;
    // Average word length of 3 letters is simple prose, 8 is dense technical text.
    let complexity_score = clamp01((avg_word_len - 3.0) / 5.0);

    LinguisticFeatures {
        sentiment_score: sentiment_score.clamp(-1.0, 1.0),
        readability_score,
        formality_score,
        complexity_score,
    }
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
