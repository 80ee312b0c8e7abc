//! services/api/src/adapters/heuristic.rs
//!
//! A rule-based `Classifier` that needs no external service. It is the default
//! classifier when no model key is configured and the fallback of the LLM adapter.

use async_trait::async_trait;
use misinfo_core::analytics::source_host;
use misinfo_core::domain::{
    Classification, ClassificationLabel, ContentFeatures, EmotionalTone, Prediction, Verification,
};
use misinfo_core::linguistics;
use misinfo_core::ports::{Classifier, PortResult};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const HEURISTIC_MODEL_VERSION: &str = "heuristic-v1";

/// Phrases that on their own mark content as misinformation.
const STRONG_PHRASES: &[&str] = &[
    "conspiracy",
    "doctors hate",
    "miracle cure",
    "won't believe",
    "exposed",
    "don't want you to know",
    "doesn't want you to know",
];

/// Phrases that make content suspicious; two or more count as misinformation.
const WEAK_PHRASES: &[&str] = &["shocking", "urgent", "secret", "explosive", "one weird trick"];

const SOCIAL_HOSTS: &[&str] = &[
    "twitter.com", "x.com", "facebook.com", "tiktok.com", "instagram.com", "reddit.com",
];

const ESTABLISHED_HOSTS: &[&str] = &[
    "reuters.com", "apnews.com", "bbc.co.uk", "bbc.com", "nature.com", "who.int",
];

fn satire_pattern() -> &'static Regex {
    static SATIRE: OnceLock<Regex> = OnceLock::new();
    SATIRE.get_or_init(|| {
        Regex::new(r"(?i)\b(satire|satirical|parody|the onion|babylon bee)\b")
            .expect("satire pattern is a valid regex")
    })
}

/// Deterministic phrase-and-source classifier.
#[derive(Clone, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// The synchronous core of `classify`, shared with the LLM fallback path.
    pub fn evaluate(&self, content: &str, source_url: Option<&str>) -> Classification {
        let lowered = content.to_lowercase();
        let strong: Vec<&str> = STRONG_PHRASES
            .iter()
            .copied()
            .filter(|p| lowered.contains(p))
            .collect();
        let weak: Vec<&str> = WEAK_PHRASES
            .iter()
            .copied()
            .filter(|p| lowered.contains(p))
            .collect();
        let hits = strong.len() + weak.len();
        let satire = satire_pattern().is_match(content);

        let label = if satire {
            ClassificationLabel::Satire
        } else if !strong.is_empty() || weak.len() >= 2 {
            ClassificationLabel::Misinformation
        } else if weak.len() == 1 {
            ClassificationLabel::Suspicious
        } else {
            ClassificationLabel::Authentic
        };

        let confidence = match label {
            ClassificationLabel::Misinformation => (0.7 + 0.05 * hits as f64).min(0.95),
            ClassificationLabel::Suspicious => 0.6,
            ClassificationLabel::Satire => 0.75,
            ClassificationLabel::Authentic => 0.65,
        };

        let reasoning = match label {
            ClassificationLabel::Misinformation => format!(
                "Content contains sensational language patterns commonly associated \
                 with misinformation ({})",
                strong.iter().chain(weak.iter()).copied().collect::<Vec<_>>().join(", ")
            ),
            ClassificationLabel::Suspicious => format!(
                "Content uses attention-seeking language ({}) without supporting evidence",
                weak.join(", ")
            ),
            ClassificationLabel::Satire => {
                "Content identifies itself as satire or parody".to_string()
            }
            ClassificationLabel::Authentic => {
                "Content appears to follow factual reporting patterns".to_string()
            }
        };

        let source_credibility = source_credibility(source_url);
        let scores = linguistics::analyze(content);
        let exclamations = content.matches('!').count();

        let emotional_tone = if hits > 0 || exclamations >= 2 {
            EmotionalTone::HighlyEmotional
        } else if scores.sentiment_score <= -0.3 {
            EmotionalTone::Negative
        } else if scores.sentiment_score >= 0.3 {
            EmotionalTone::Positive
        } else {
            EmotionalTone::Neutral
        };

        let language_patterns: BTreeSet<String> = if hits > 0 {
            ["sensational", "emotional", "urgent"].iter().map(|s| s.to_string()).collect()
        } else {
            ["factual", "neutral", "measured"].iter().map(|s| s.to_string()).collect()
        };

        let mut risk_factors = Vec::new();
        if hits > 0 {
            risk_factors.push("sensational language".to_string());
            risk_factors.push("unverifiable claims".to_string());
        }
        if source_credibility < 0.4 {
            risk_factors.push("low source credibility".to_string());
        }
        if exclamations >= 2 {
            risk_factors.push("excessive punctuation".to_string());
        }

        let recommendation = match label {
            ClassificationLabel::Misinformation => {
                "Do not share; check the claim against established fact-checkers"
            }
            ClassificationLabel::Suspicious => "Verify information from multiple credible sources",
            ClassificationLabel::Satire => "Treat as satire, not as a factual report",
            ClassificationLabel::Authentic => {
                "No red flags found; still verify important claims with the original source"
            }
        };

        Classification {
            prediction: Prediction {
                classification: label,
                confidence,
                reasoning,
                model_version: HEURISTIC_MODEL_VERSION.to_string(),
            },
            features: ContentFeatures {
                source_credibility,
                language_patterns,
                emotional_tone,
                risk_factors,
                linguistic_features: None,
            },
            verification: Verification {
                cross_references: Vec::new(),
                sources_checked: source_url.map(str::to_string).into_iter().collect(),
                fact_check_results: Vec::new(),
                recommendation: Some(recommendation.to_string()),
            },
        }
    }
}

/// Scores a source URL by scheme and host. No URL scores a neutral 0.5.
pub fn source_credibility(source_url: Option<&str>) -> f64 {
    let Some(url) = source_url else {
        return 0.5;
    };
    let Some(authority) = source_host(url) else {
        return 0.5;
    };
    let host = authority.split(':').next().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    let matches_any = |hosts: &[&str]| {
        hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
    };

    let base: f64 = if host.ends_with(".gov") || host.ends_with(".edu") {
        0.9
    } else if matches_any(ESTABLISHED_HOSTS) {
        0.85
    } else if matches_any(SOCIAL_HOSTS) {
        0.3
    } else {
        0.55
    };
    let penalty = if url.to_lowercase().starts_with("https://") { 0.0 } else { 0.1 };
    (base - penalty).clamp(0.0, 1.0)
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    async fn classify(
        &self,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<Classification> {
        Ok(self.evaluate(content, source_url))
    }
}
