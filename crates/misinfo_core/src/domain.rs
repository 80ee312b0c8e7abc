//! crates/misinfo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the analysis pipeline.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Content Fingerprint
//=========================================================================================

/// SHA-256 digest of the raw content string, hex encoded.
///
/// The content is hashed byte for byte, whitespace included, so two submissions
/// share a fingerprint only when their text is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn of(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Rebuilds a fingerprint from its stored hex form.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Enumerations
//=========================================================================================

/// The verdict a classifier reaches about a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassificationLabel {
    Authentic,
    Misinformation,
    Suspicious,
    Satire,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentic => "authentic",
            Self::Misinformation => "misinformation",
            Self::Suspicious => "suspicious",
            Self::Satire => "satire",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "authentic" => Some(Self::Authentic),
            "misinformation" => Some(Self::Misinformation),
            "suspicious" => Some(Self::Suspicious),
            "satire" => Some(Self::Satire),
            _ => None,
        }
    }

    pub fn all() -> [ClassificationLabel; 4] {
        [
            Self::Authentic,
            Self::Misinformation,
            Self::Suspicious,
            Self::Satire,
        ]
    }
}

/// Which tier of the pipeline produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisType {
    Quick,
    Deep,
    RealTime,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
            Self::RealTime => "real-time",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quick" => Some(Self::Quick),
            "deep" => Some(Self::Deep),
            "real-time" => Some(Self::RealTime),
            _ => None,
        }
    }
}

/// Requested depth for a synchronous analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    #[default]
    Quick,
    Deep,
}

impl From<AnalysisMode> for AnalysisType {
    fn from(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Quick => AnalysisType::Quick,
            AnalysisMode::Deep => AnalysisType::Deep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionalTone {
    Neutral,
    Positive,
    Negative,
    HighlyEmotional,
}

impl EmotionalTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::HighlyEmotional => "highly-emotional",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "neutral" => Some(Self::Neutral),
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "highly-emotional" | "highly emotional" => Some(Self::HighlyEmotional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStatus {
    Pending,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

//=========================================================================================
// Classifier Output
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub classification: ClassificationLabel,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
    pub model_version: String,
}

/// Scores produced by the deep feature pass. The key set is closed: these four
/// scores are the only free-form features a record may carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinguisticFeatures {
    /// `[-1, 1]`, negative to positive.
    pub sentiment_score: f64,
    pub readability_score: f64,
    pub formality_score: f64,
    pub complexity_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentFeatures {
    pub source_credibility: f64,
    pub language_patterns: BTreeSet<String>,
    pub emotional_tone: EmotionalTone,
    pub risk_factors: Vec<String>,
    /// Present only on deep analyses.
    pub linguistic_features: Option<LinguisticFeatures>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactCheckResult {
    pub source: String,
    pub verdict: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Verification {
    pub cross_references: Vec<String>,
    pub sources_checked: Vec<String>,
    pub fact_check_results: Vec<FactCheckResult>,
    pub recommendation: Option<String>,
}

/// Everything a `Classifier` returns for one piece of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub prediction: Prediction,
    pub features: ContentFeatures,
    pub verification: Verification,
}

//=========================================================================================
// Analysis Record
//=========================================================================================

/// One immutable snapshot of an analysis, owned by the caller who requested it.
///
/// Completed records always carry a prediction and features; failed records carry
/// a failure reason instead. Use the constructors to keep that invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub fingerprint: ContentFingerprint,
    pub source_url: Option<String>,
    pub analysis_type: AnalysisType,
    pub prediction: Option<Prediction>,
    pub features: Option<ContentFeatures>,
    pub verification: Verification,
    pub processing_time_ms: u64,
    pub status: AnalysisStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the verdict was reused from an earlier analysis of the same content.
    pub reused_from: Option<Uuid>,
}

/// The identifying part of a record, shared by completed and failed records.
#[derive(Debug, Clone)]
pub struct AnalysisSubject {
    pub owner_id: Uuid,
    pub content: String,
    pub fingerprint: ContentFingerprint,
    pub source_url: Option<String>,
    pub analysis_type: AnalysisType,
}

impl AnalysisRecord {
    pub fn completed(
        subject: AnalysisSubject,
        classification: Classification,
        processing_time_ms: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: subject.owner_id,
            content: subject.content,
            fingerprint: subject.fingerprint,
            source_url: subject.source_url,
            analysis_type: subject.analysis_type,
            prediction: Some(classification.prediction),
            features: Some(classification.features),
            verification: classification.verification,
            processing_time_ms,
            status: AnalysisStatus::Completed,
            failure_reason: None,
            created_at,
            reused_from: None,
        }
    }

    pub fn failed(
        subject: AnalysisSubject,
        reason: impl Into<String>,
        processing_time_ms: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: subject.owner_id,
            content: subject.content,
            fingerprint: subject.fingerprint,
            source_url: subject.source_url,
            analysis_type: subject.analysis_type,
            prediction: None,
            features: None,
            verification: Verification::default(),
            processing_time_ms,
            status: AnalysisStatus::Failed,
            failure_reason: Some(reason.into()),
            created_at,
            reused_from: None,
        }
    }

    /// A new record for `owner_id` that reuses this record's verdict.
    ///
    /// The copy gets its own id and timestamp and points back at the analysis that
    /// produced the verdict.
    pub fn reissue(
        &self,
        owner_id: Uuid,
        processing_time_ms: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            processing_time_ms,
            created_at,
            reused_from: Some(self.reused_from.unwrap_or(self.id)),
            ..self.clone()
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AnalysisStatus::Completed
    }

    pub fn classification(&self) -> Option<ClassificationLabel> {
        self.prediction.as_ref().map(|p| p.classification)
    }
}

//=========================================================================================
// Realtime Feed
//=========================================================================================

/// A single piece of content observed by a live (or simulated) feed.
#[derive(Debug, Clone)]
pub struct ContentEvent {
    pub id: String,
    pub content: String,
    pub source: String,
    pub observed_at: DateTime<Utc>,
}
