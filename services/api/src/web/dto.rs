//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST and WebSocket surfaces, and their
//! conversions from the core's domain types. All payloads are camelCase on the wire.

use chrono::{DateTime, Utc};
use misinfo_core::analytics::{AnalyticsReport, ClassificationShare, SourceStanding, TrendBucket};
use misinfo_core::batch::{BatchOutcome, BatchReport, BatchResult};
use misinfo_core::domain::{
    AnalysisRecord, ContentFeatures, FactCheckResult, LinguisticFeatures, Prediction,
    Verification,
};
use misinfo_core::history::HistoryPage;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Analysis Records
//=========================================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionView {
    pub classification: String,
    pub confidence: f64,
    pub reasoning: String,
    pub model_version: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinguisticFeaturesView {
    pub sentiment_score: f64,
    pub readability_score: f64,
    pub formality_score: f64,
    pub complexity_score: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesView {
    pub source_credibility: f64,
    pub language_patterns: Vec<String>,
    pub emotional_tone: String,
    pub risk_factors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linguistic_features: Option<LinguisticFeaturesView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckView {
    pub source: String,
    pub verdict: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationView {
    pub cross_references: Vec<String>,
    pub sources_checked: Vec<String>,
    pub fact_check_results: Vec<FactCheckView>,
    pub recommendation: Option<String>,
}

/// One analysis record as seen by its owner.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisView {
    pub id: Uuid,
    pub content: String,
    /// Hex SHA-256 of the content.
    pub content_hash: String,
    pub source_url: Option<String>,
    pub analysis_type: String,
    pub status: String,
    pub prediction: Option<PredictionView>,
    pub features: Option<FeaturesView>,
    pub verification: VerificationView,
    /// Milliseconds spent classifying.
    pub processing_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Prediction> for PredictionView {
    fn from(p: &Prediction) -> Self {
        Self {
            classification: p.classification.as_str().to_string(),
            confidence: p.confidence,
            reasoning: p.reasoning.clone(),
            model_version: p.model_version.clone(),
        }
    }
}

impl From<&LinguisticFeatures> for LinguisticFeaturesView {
    fn from(l: &LinguisticFeatures) -> Self {
        Self {
            sentiment_score: l.sentiment_score,
            readability_score: l.readability_score,
            formality_score: l.formality_score,
            complexity_score: l.complexity_score,
        }
    }
}

impl From<&ContentFeatures> for FeaturesView {
    fn from(f: &ContentFeatures) -> Self {
        Self {
            source_credibility: f.source_credibility,
            language_patterns: f.language_patterns.iter().cloned().collect(),
            emotional_tone: f.emotional_tone.as_str().to_string(),
            risk_factors: f.risk_factors.clone(),
            linguistic_features: f.linguistic_features.as_ref().map(Into::into),
        }
    }
}

impl From<&FactCheckResult> for FactCheckView {
    fn from(f: &FactCheckResult) -> Self {
        Self {
            source: f.source.clone(),
            verdict: f.verdict.clone(),
            confidence: f.confidence,
        }
    }
}

impl From<&Verification> for VerificationView {
    fn from(v: &Verification) -> Self {
        Self {
            cross_references: v.cross_references.clone(),
            sources_checked: v.sources_checked.clone(),
            fact_check_results: v.fact_check_results.iter().map(Into::into).collect(),
            recommendation: v.recommendation.clone(),
        }
    }
}

impl From<&AnalysisRecord> for AnalysisView {
    fn from(r: &AnalysisRecord) -> Self {
        Self {
            id: r.id,
            content: r.content.clone(),
            content_hash: r.fingerprint.as_str().to_string(),
            source_url: r.source_url.clone(),
            analysis_type: r.analysis_type.as_str().to_string(),
            status: r.status.as_str().to_string(),
            prediction: r.prediction.as_ref().map(Into::into),
            features: r.features.as_ref().map(Into::into),
            verification: (&r.verification).into(),
            processing_time: r.processing_time_ms,
            failure_reason: r.failure_reason.clone(),
            created_at: r.created_at,
        }
    }
}

//=========================================================================================
// Analyze
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// 10 to 10,000 characters.
    pub content: String,
    #[serde(default, alias = "url")]
    pub source_url: Option<String>,
    /// `quick` (default) or `deep`.
    #[serde(default)]
    pub analysis_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: AnalysisView,
    /// True when an earlier analysis of identical content was reused.
    pub from_cache: bool,
}

/// One analysed item pushed over the realtime channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemView {
    #[serde(flatten)]
    pub analysis: AnalysisView,
    /// Platform the item was observed on.
    pub source: String,
}

//=========================================================================================
// Batch
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemRequest {
    pub id: String,
    pub content: String,
    #[serde(default, alias = "sourceUrl")]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// 1 to 50 items.
    pub contents: Vec<BatchItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchErrorView {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemView {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchErrorView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummaryView {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Wall-clock milliseconds for the whole batch.
    pub processing_time: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResponse {
    pub results: Vec<BatchItemView>,
    pub summary: BatchSummaryView,
}

impl From<BatchResult> for BatchItemView {
    fn from(result: BatchResult) -> Self {
        match result.outcome {
            BatchOutcome::Completed { record, from_cache } => Self {
                id: result.item_id,
                success: true,
                analysis: Some((&record).into()),
                from_cache: Some(from_cache),
                error: None,
            },
            BatchOutcome::Failed { kind, message } => Self {
                id: result.item_id,
                success: false,
                analysis: None,
                from_cache: None,
                error: Some(BatchErrorView {
                    kind: kind.as_str().to_string(),
                    message,
                }),
            },
        }
    }
}

impl From<BatchReport> for BatchResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            summary: BatchSummaryView {
                total: report.summary.total,
                successful: report.summary.successful,
                failed: report.summary.failed,
                processing_time: report.summary.elapsed.as_millis() as u64,
            },
            results: report.results.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// History
//=========================================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// One of `authentic`, `misinformation`, `suspicious`, `satire`.
    pub classification: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based, defaults to 1.
    pub page: Option<u64>,
    /// 1 to 100, defaults to 20.
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationView {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub analyses: Vec<AnalysisView>,
    pub pagination: PaginationView,
}

impl From<HistoryPage> for HistoryResponse {
    fn from(page: HistoryPage) -> Self {
        Self {
            analyses: page.records.iter().map(Into::into).collect(),
            pagination: PaginationView {
                page: page.page,
                limit: page.limit,
                total: page.total,
                pages: page.pages,
            },
        }
    }
}

//=========================================================================================
// Analytics
//=========================================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardParams {
    /// `24h`, `7d`, `30d` (default) or `90d`.
    pub time_range: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total_analyses: u64,
    pub misinformation_detected: u64,
    /// Mean classification time in milliseconds.
    pub avg_processing_time: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendView {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub analyses: u64,
    pub misinformation: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownView {
    pub classification: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceView {
    pub source: String,
    pub analyses: u64,
    pub credibility: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub time_range: String,
    pub summary: SummaryView,
    pub trend: Vec<TrendView>,
    pub breakdown: Vec<BreakdownView>,
    pub top_sources: Vec<SourceView>,
}

impl From<&TrendBucket> for TrendView {
    fn from(b: &TrendBucket) -> Self {
        Self {
            date: b.date_key(),
            analyses: b.analyses_count,
            misinformation: b.misinformation_count,
        }
    }
}

impl From<&ClassificationShare> for BreakdownView {
    fn from(s: &ClassificationShare) -> Self {
        Self {
            classification: s.classification.as_str().to_string(),
            count: s.count,
            percentage: s.percentage,
        }
    }
}

impl From<&SourceStanding> for SourceView {
    fn from(s: &SourceStanding) -> Self {
        Self {
            source: s.source.clone(),
            analyses: s.analyses,
            credibility: s.avg_credibility,
        }
    }
}

impl From<AnalyticsReport> for DashboardResponse {
    fn from(report: AnalyticsReport) -> Self {
        Self {
            time_range: report.window.as_str().to_string(),
            summary: SummaryView {
                total_analyses: report.summary.total_analyses,
                misinformation_detected: report.summary.misinformation_detected,
                avg_processing_time: report.summary.avg_processing_time_ms,
            },
            trend: report.trend.iter().map(Into::into).collect(),
            breakdown: report.breakdown.iter().map(Into::into).collect(),
            top_sources: report.top_sources.iter().map(Into::into).collect(),
        }
    }
}
