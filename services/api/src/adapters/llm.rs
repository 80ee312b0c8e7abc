//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the classification LLM.
//! It implements the `Classifier` port from the core crate, and falls back to the
//! heuristic classifier whenever the model call fails or its answer cannot be parsed.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use misinfo_core::domain::{
    Classification, ClassificationLabel, ContentFeatures, EmotionalTone, FactCheckResult,
    LinguisticFeatures, Prediction, Verification,
};
use misinfo_core::linguistics;
use misinfo_core::ports::{Classifier, PortError, PortResult};
use serde::Deserialize;
use tracing::{debug, warn};

use super::heuristic::HeuristicClassifier;

//=========================================================================================
// Prompts
//=========================================================================================

const QUICK_PROMPT: &str = r#"You are an expert misinformation detection system. Assess the user's content and answer with JSON only, no additional text:
{
  "classification": "authentic" | "misinformation" | "suspicious" | "satire",
  "confidence": 0.0-1.0,
  "reasoning": "short explanation",
  "languagePatterns": ["detected", "patterns"],
  "emotionalTone": "neutral" | "positive" | "negative" | "highly-emotional",
  "sourceCredibility": 0.0-1.0,
  "riskFactors": ["potential", "risks"],
  "recommendations": "what the reader should do"
}
Look for sensational or misleading language, unverifiable claims, emotional manipulation, missing sources, conspiracy indicators and clickbait."#;

const DEEP_PROMPT: &str = r#"You are an expert misinformation detection system performing a comprehensive review. Answer with JSON only, no additional text:
{
  "classification": "authentic" | "misinformation" | "suspicious" | "satire",
  "confidence": 0.0-1.0,
  "reasoning": "comprehensive explanation",
  "languagePatterns": ["detected", "patterns"],
  "emotionalTone": "neutral" | "positive" | "negative" | "highly-emotional",
  "sourceCredibility": 0.0-1.0,
  "riskFactors": ["potential", "risks"],
  "factCheckResults": [{"source": "name", "result": "true" | "false" | "mixed", "confidence": 0.0-1.0}],
  "crossReferences": ["relevant", "sources"],
  "recommendations": "detailed recommendations",
  "linguisticFeatures": {
    "sentimentScore": -1.0 to 1.0,
    "readabilityScore": 0.0-1.0,
    "formalityScore": 0.0-1.0,
    "complexityScore": 0.0-1.0
  }
}
Fact-check against known information, assess the source, and look for bias, emotional manipulation and conspiracy indicators."#;

//=========================================================================================
// Model Answer Shape
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelVerdict {
    classification: String,
    confidence: Option<f64>,
    reasoning: Option<String>,
    #[serde(default)]
    language_patterns: Vec<String>,
    emotional_tone: Option<String>,
    source_credibility: Option<f64>,
    #[serde(default)]
    risk_factors: Vec<String>,
    recommendations: Option<String>,
    #[serde(default)]
    fact_check_results: Vec<ModelFactCheck>,
    #[serde(default)]
    cross_references: Vec<String>,
    linguistic_features: Option<ModelLinguistics>,
}

#[derive(Debug, Deserialize)]
struct ModelFactCheck {
    source: String,
    #[serde(alias = "verdict")]
    result: String,
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelLinguistics {
    sentiment_score: f64,
    readability_score: f64,
    formality_score: f64,
    complexity_score: f64,
}

/// Removes a surrounding markdown code fence, if the model added one.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn tone_from_model(raw: Option<&str>) -> EmotionalTone {
    let Some(raw) = raw else {
        return EmotionalTone::Neutral;
    };
    let lowered = raw.trim().to_lowercase();
    EmotionalTone::parse(&lowered).unwrap_or_else(|| {
        if ["emotional", "sensational", "manipulative", "alarmist"]
            .iter()
            .any(|w| lowered.contains(w))
        {
            EmotionalTone::HighlyEmotional
        } else {
            EmotionalTone::Neutral
        }
    })
}

/// Parses a model answer into a `Classification`, clamping every score into range.
pub fn parse_verdict(
    raw: &str,
    source_url: Option<&str>,
    model_version: &str,
) -> Result<Classification, String> {
    let verdict: ModelVerdict =
        serde_json::from_str(strip_fences(raw)).map_err(|e| e.to_string())?;
    let label = ClassificationLabel::parse(&verdict.classification.trim().to_lowercase())
        .ok_or_else(|| format!("unknown classification '{}'", verdict.classification))?;

    let mut language_patterns: std::collections::BTreeSet<String> =
        verdict.language_patterns.into_iter().collect();
    if language_patterns.is_empty() {
        language_patterns.insert("analyzed".to_string());
    }

    Ok(Classification {
        prediction: Prediction {
            classification: label,
            confidence: verdict.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
            reasoning: verdict
                .reasoning
                .unwrap_or_else(|| "Analysis completed by language model".to_string()),
            model_version: model_version.to_string(),
        },
        features: ContentFeatures {
            source_credibility: verdict.source_credibility.unwrap_or(0.5).clamp(0.0, 1.0),
            language_patterns,
            emotional_tone: tone_from_model(verdict.emotional_tone.as_deref()),
            risk_factors: verdict.risk_factors,
            linguistic_features: verdict.linguistic_features.map(|l| LinguisticFeatures {
                sentiment_score: l.sentiment_score.clamp(-1.0, 1.0),
                readability_score: l.readability_score.clamp(0.0, 1.0),
                formality_score: l.formality_score.clamp(0.0, 1.0),
                complexity_score: l.complexity_score.clamp(0.0, 1.0),
            }),
        },
        verification: Verification {
            cross_references: verdict.cross_references,
            sources_checked: source_url.map(str::to_string).into_iter().collect(),
            fact_check_results: verdict
                .fact_check_results
                .into_iter()
                .map(|f| FactCheckResult {
                    source: f.source,
                    verdict: f.result,
                    confidence: f.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
                })
                .collect(),
            recommendation: Some(verdict.recommendations.unwrap_or_else(|| {
                "Verify information from multiple credible sources".to_string()
            })),
        },
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `Classifier` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct LlmClassifier {
    client: Client<OpenAIConfig>,
    model: String,
    fallback: HeuristicClassifier,
}

impl LlmClassifier {
    /// Creates a new `LlmClassifier`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self {
            client,
            model,
            fallback: HeuristicClassifier::new(),
        }
    }

    async fn ask(
        &self,
        system: &str,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<String> {
        let user_text = format!(
            "Content: \"{}\"\nSource URL: {}",
            content,
            source_url.unwrap_or("Not provided")
        );
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_text)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected(
                    "Classifier LLM response contained no text content.".to_string(),
                )
            })
    }

    /// Asks the model and parses its verdict; any failure yields `None`.
    async fn model_verdict(
        &self,
        prompt: &str,
        content: &str,
        source_url: Option<&str>,
        model_version: &str,
    ) -> Option<Classification> {
        match self.ask(prompt, content, source_url).await {
            Ok(raw) => match parse_verdict(&raw, source_url, model_version) {
                Ok(classification) => Some(classification),
                Err(e) => {
                    warn!("Unparsable classifier answer, using heuristic fallback: {}", e);
                    debug!(raw = %raw, "raw classifier answer");
                    None
                }
            },
            Err(e) => {
                warn!("Classifier LLM call failed, using heuristic fallback: {}", e);
                None
            }
        }
    }
}

//=========================================================================================
// `Classifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<Classification> {
        let verdict = self
            .model_verdict(QUICK_PROMPT, content, source_url, &self.model)
            .await;
        Ok(verdict.unwrap_or_else(|| self.fallback.evaluate(content, source_url)))
    }

    async fn classify_deep(
        &self,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<Classification> {
        let version = format!("{}-deep", self.model);
        let mut classification = self
            .model_verdict(DEEP_PROMPT, content, source_url, &version)
            .await
            .unwrap_or_else(|| self.fallback.evaluate(content, source_url));
        if classification.features.linguistic_features.is_none() {
            classification.features.linguistic_features = Some(linguistics::analyze(content));
        }
        Ok(classification)
    }
}
