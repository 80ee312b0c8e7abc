//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `AnalysisStore` and `IdentityService` ports from the core crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use misinfo_core::domain::{
    AnalysisRecord, AnalysisStatus, AnalysisType, ClassificationLabel, ContentFeatures,
    ContentFingerprint, EmotionalTone, FactCheckResult, LinguisticFeatures, Prediction,
    Verification,
};
use misinfo_core::ports::{
    AnalysisStore, HistoryFilter, IdentityService, PortError, PortResult,
};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `AnalysisStore` and `IdentityService` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct FactCheckRow {
    source: String,
    verdict: String,
    confidence: f64,
}

#[derive(FromRow)]
struct AnalysisRow {
    id: Uuid,
    owner_id: Uuid,
    content: String,
    fingerprint: String,
    source_url: Option<String>,
    analysis_type: String,
    status: String,
    failure_reason: Option<String>,
    classification: Option<String>,
    confidence: Option<f64>,
    reasoning: Option<String>,
    model_version: Option<String>,
    source_credibility: Option<f64>,
    language_patterns: Vec<String>,
    emotional_tone: Option<String>,
    risk_factors: Vec<String>,
    sentiment_score: Option<f64>,
    readability_score: Option<f64>,
    formality_score: Option<f64>,
    complexity_score: Option<f64>,
    cross_references: Vec<String>,
    sources_checked: Vec<String>,
    fact_check_results: Json<Vec<FactCheckRow>>,
    recommendation: Option<String>,
    processing_time_ms: i64,
    created_at: DateTime<Utc>,
    reused_from: Option<Uuid>,
}

impl AnalysisRow {
    fn to_domain(self) -> PortResult<AnalysisRecord> {
        let corrupt = |column: &str, value: &str| {
            PortError::Unexpected(format!(
                "analysis {} has an invalid {}: '{}'",
                self.id, column, value
            ))
        };

        let analysis_type = AnalysisType::parse(&self.analysis_type)
            .ok_or_else(|| corrupt("analysis_type", &self.analysis_type))?;
        let status = AnalysisStatus::parse(&self.status)
            .ok_or_else(|| corrupt("status", &self.status))?;

        let prediction = match &self.classification {
            Some(raw) => Some(Prediction {
                classification: ClassificationLabel::parse(raw)
                    .ok_or_else(|| corrupt("classification", raw))?,
                confidence: self.confidence.unwrap_or(0.0),
                reasoning: self.reasoning.clone().unwrap_or_default(),
                model_version: self.model_version.clone().unwrap_or_default(),
            }),
            None => None,
        };

        let linguistic_features = match (
            self.sentiment_score,
            self.readability_score,
            self.formality_score,
            self.complexity_score,
        ) {
            (Some(sentiment), Some(readability), Some(formality), Some(complexity)) => {
                Some(LinguisticFeatures {
                    sentiment_score: sentiment,
                    readability_score: readability,
                    formality_score: formality,
                    complexity_score: complexity,
                })
            }
            _ => None,
        };

        let features = match (self.source_credibility, &self.emotional_tone) {
            (Some(credibility), Some(tone)) => Some(ContentFeatures {
                source_credibility: credibility,
                language_patterns: self.language_patterns.iter().cloned().collect(),
                emotional_tone: EmotionalTone::parse(tone)
                    .ok_or_else(|| corrupt("emotional_tone", tone))?,
                risk_factors: self.risk_factors.clone(),
                linguistic_features,
            }),
            _ => None,
        };

        let Json(fact_checks) = self.fact_check_results;
        let verification = Verification {
            cross_references: self.cross_references,
            sources_checked: self.sources_checked,
            fact_check_results: fact_checks
                .into_iter()
                .map(|f| FactCheckResult {
                    source: f.source,
                    verdict: f.verdict,
                    confidence: f.confidence,
                })
                .collect(),
            recommendation: self.recommendation,
        };

        Ok(AnalysisRecord {
            id: self.id,
            owner_id: self.owner_id,
            content: self.content,
            fingerprint: ContentFingerprint::from_hex(self.fingerprint),
            source_url: self.source_url,
            analysis_type,
            prediction,
            features,
            verification,
            processing_time_ms: self.processing_time_ms.max(0) as u64,
            status,
            failure_reason: self.failure_reason,
            created_at: self.created_at,
            reused_from: self.reused_from,
        })
    }
}

fn rows_to_domain(rows: Vec<AnalysisRow>) -> PortResult<Vec<AnalysisRecord>> {
    rows.into_iter().map(AnalysisRow::to_domain).collect()
}

/// Appends the owner scope and the optional history filters.
fn push_history_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    owner_id: Uuid,
    filter: &HistoryFilter,
) {
    builder.push(" WHERE owner_id = ").push_bind(owner_id);
    if let Some(label) = filter.classification {
        builder.push(" AND classification = ").push_bind(label.as_str());
    }
    if let Some(start) = filter.start {
        builder.push(" AND created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        builder.push(" AND created_at <= ").push_bind(end);
    }
}

//=========================================================================================
// `AnalysisStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl AnalysisStore for DbAdapter {
    async fn insert_analysis(&self, record: &AnalysisRecord) -> PortResult<()> {
        let prediction = record.prediction.as_ref();
        let features = record.features.as_ref();
        let linguistic = features.and_then(|f| f.linguistic_features);
        let fact_checks: Vec<FactCheckRow> = record
            .verification
            .fact_check_results
            .iter()
            .map(|f| FactCheckRow {
                source: f.source.clone(),
                verdict: f.verdict.clone(),
                confidence: f.confidence,
            })
            .collect();

        sqlx::query(
            r#"
            INSERT INTO analyses (
                id, owner_id, content, fingerprint, source_url, analysis_type,
                status, failure_reason,
                classification, confidence, reasoning, model_version,
                source_credibility, language_patterns, emotional_tone, risk_factors,
                sentiment_score, readability_score, formality_score, complexity_score,
                cross_references, sources_checked, fact_check_results, recommendation,
                processing_time_ms, created_at, reused_from
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.content)
        .bind(record.fingerprint.as_str())
        .bind(record.source_url.as_deref())
        .bind(record.analysis_type.as_str())
        .bind(record.status.as_str())
        .bind(record.failure_reason.as_deref())
        .bind(prediction.map(|p| p.classification.as_str()))
        .bind(prediction.map(|p| p.confidence))
        .bind(prediction.map(|p| p.reasoning.as_str()))
        .bind(prediction.map(|p| p.model_version.as_str()))
        .bind(features.map(|f| f.source_credibility))
        .bind(
            features
                .map(|f| f.language_patterns.iter().cloned().collect::<Vec<_>>())
                .unwrap_or_default(),
        )
        .bind(features.map(|f| f.emotional_tone.as_str()))
        .bind(features.map(|f| f.risk_factors.clone()).unwrap_or_default())
        .bind(linguistic.map(|l| l.sentiment_score))
        .bind(linguistic.map(|l| l.readability_score))
        .bind(linguistic.map(|l| l.formality_score))
        .bind(linguistic.map(|l| l.complexity_score))
        .bind(&record.verification.cross_references)
        .bind(&record.verification.sources_checked)
        .bind(Json(fact_checks))
        .bind(record.verification.recommendation.as_deref())
        .bind(record.processing_time_ms as i64)
        .bind(record.created_at)
        .bind(record.reused_from)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn latest_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
        since: DateTime<Utc>,
    ) -> PortResult<Option<AnalysisRecord>> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT * FROM analyses
            WHERE fingerprint = $1 AND status = 'completed' AND reused_from IS NULL
              AND created_at >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(fingerprint.as_str())
        .bind(since)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(AnalysisRow::to_domain).transpose()
    }

    async fn analyses_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<AnalysisRecord>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT * FROM analyses
            WHERE owner_id = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        rows_to_domain(rows)
    }

    async fn get_analysis(&self, owner_id: Uuid, id: Uuid) -> PortResult<AnalysisRecord> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analyses WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match row {
            Some(row) => row.to_domain(),
            None => Err(PortError::NotFound(format!("Analysis {} not found", id))),
        }
    }

    async fn list_analyses(
        &self,
        owner_id: Uuid,
        filter: &HistoryFilter,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<AnalysisRecord>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM analyses");
        push_history_filters(&mut count, owner_id, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM analyses");
        push_history_filters(&mut select, owner_id, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        let rows: Vec<AnalysisRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok((rows_to_domain(rows)?, total.max(0) as u64))
    }
}

//=========================================================================================
// `IdentityService` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityService for DbAdapter {
    async fn resolve_owner(&self, token: &str) -> PortResult<Uuid> {
        let owner: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT owner_id FROM auth_sessions
            WHERE token = $1 AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        owner.ok_or(PortError::Unauthorized)
    }
}
