//! crates/misinfo_core/src/engine.rs
//!
//! The analysis engine: validation, fingerprinting, cache lookup, classification,
//! persistence, and result shaping for a single piece of content.

use chrono::{Duration, Utc};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::FingerprintCache;
use crate::domain::{
    AnalysisMode, AnalysisRecord, AnalysisSubject, AnalysisType, Classification, ContentEvent,
    ContentFingerprint,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::ports::{AnalysisStore, Classifier};

pub const MIN_CONTENT_CHARS: usize = 10;
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// One synchronous analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub owner_id: Uuid,
    pub content: String,
    pub source_url: Option<String>,
    pub mode: AnalysisMode,
}

/// The engine's answer: a record and whether it was served from the fingerprint cache.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub from_cache: bool,
}

pub struct AnalysisEngine {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn AnalysisStore>,
    cache: FingerprintCache,
}

impl AnalysisEngine {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn AnalysisStore>,
        freshness: Duration,
    ) -> Self {
        let cache = FingerprintCache::new(store.clone(), freshness);
        Self {
            classifier,
            store,
            cache,
        }
    }

    pub fn cache(&self) -> &FingerprintCache {
        &self.cache
    }

    /// Analyses one piece of content on behalf of `request.owner_id`.
    ///
    /// Invalid input is rejected before any work. A classifier failure is recorded as a
    /// failed record and surfaced as `Classification`; a failed write of a completed
    /// record is surfaced as `Persistence` and the result is not cached.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisResult<AnalysisOutcome> {
        validate_content(&request.content)?;
        if let Some(url) = request.source_url.as_deref() {
            validate_source_url(url)?;
        }

        let started = Instant::now();
        let fingerprint = ContentFingerprint::of(&request.content);

        if let Some(cached) = self.cache.lookup(&fingerprint).await {
            if reusable_for(&cached, &request) {
                return self.reissue(&cached, request.owner_id, started).await;
            }
        }

        let subject = AnalysisSubject {
            owner_id: request.owner_id,
            content: request.content,
            fingerprint,
            source_url: request.source_url,
            analysis_type: request.mode.into(),
        };

        let classified = match request.mode {
            AnalysisMode::Quick => {
                self.classifier
                    .classify(&subject.content, subject.source_url.as_deref())
                    .await
            }
            AnalysisMode::Deep => {
                self.classifier
                    .classify_deep(&subject.content, subject.source_url.as_deref())
                    .await
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let classification = match classified {
            Ok(classification) => normalize(classification),
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    owner = %subject.owner_id,
                    fingerprint = %subject.fingerprint,
                    "classification failed: {}",
                    reason
                );
                let failed =
                    AnalysisRecord::failed(subject, reason.clone(), elapsed_ms, Utc::now());
                if let Err(store_err) = self.store.insert_analysis(&failed).await {
                    error!(
                        record = %failed.id,
                        "failed to persist failed analysis record: {}",
                        store_err
                    );
                }
                return Err(AnalysisError::Classification(reason));
            }
        };

        let record = AnalysisRecord::completed(subject, classification, elapsed_ms, Utc::now());
        if let Err(e) = self.store.insert_analysis(&record).await {
            error!(record = %record.id, "failed to persist completed analysis: {}", e);
            return Err(AnalysisError::Persistence(e.to_string()));
        }
        self.cache.admit(record.clone()).await;

        info!(
            owner = %record.owner_id,
            fingerprint = %record.fingerprint,
            mode = record.analysis_type.as_str(),
            elapsed_ms,
            "analysis completed"
        );
        Ok(AnalysisOutcome {
            record,
            from_cache: false,
        })
    }

    /// Persists a copy of a cached verdict owned by the requester.
    ///
    /// The copy is not admitted to the cache, so reuse never extends the freshness
    /// window of the analysis it came from.
    async fn reissue(
        &self,
        cached: &AnalysisRecord,
        owner_id: Uuid,
        started: Instant,
    ) -> AnalysisResult<AnalysisOutcome> {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let record = cached.reissue(owner_id, elapsed_ms, Utc::now());
        if let Err(e) = self.store.insert_analysis(&record).await {
            error!(record = %record.id, "failed to persist reused analysis: {}", e);
            return Err(AnalysisError::Persistence(e.to_string()));
        }
        info!(
            owner = %owner_id,
            fingerprint = %record.fingerprint,
            reused = %cached.id,
            "serving analysis from cache"
        );
        Ok(AnalysisOutcome {
            record,
            from_cache: true,
        })
    }

    /// Quick analysis of a feed event for the realtime monitor.
    ///
    /// Monitoring traffic is neither cached nor persisted: the record is shaped for
    /// delivery only and carries the subscriber as owner.
    pub async fn analyze_event(
        &self,
        subscriber: Uuid,
        event: &ContentEvent,
    ) -> AnalysisResult<AnalysisRecord> {
        validate_content(&event.content)?;

        let started = Instant::now();
        let classification = self
            .classifier
            .classify(&event.content, None)
            .await
            .map_err(|e| AnalysisError::Classification(e.to_string()))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let subject = AnalysisSubject {
            owner_id: subscriber,
            content: event.content.clone(),
            fingerprint: ContentFingerprint::of(&event.content),
            source_url: None,
            analysis_type: AnalysisType::RealTime,
        };
        Ok(AnalysisRecord::completed(
            subject,
            normalize(classification),
            elapsed_ms,
            event.observed_at,
        ))
    }
}

//=========================================================================================
// Validation
//=========================================================================================

pub fn validate_content(content: &str) -> AnalysisResult<()> {
    if content.trim().is_empty() {
        return Err(AnalysisError::Validation("content must not be empty".to_string()));
    }
    let chars = content.chars().count();
    if !(MIN_CONTENT_CHARS..=MAX_CONTENT_CHARS).contains(&chars) {
        return Err(AnalysisError::Validation(format!(
            "content must be between {} and {} characters, got {}",
            MIN_CONTENT_CHARS, MAX_CONTENT_CHARS, chars
        )));
    }
    Ok(())
}

pub fn validate_source_url(url: &str) -> AnalysisResult<()> {
    static URI: OnceLock<Regex> = OnceLock::new();
    let pattern = URI.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+(?:[/?#]\S*)?$")
            .expect("URI pattern is a valid regex")
    });
    if pattern.is_match(url) {
        Ok(())
    } else {
        Err(AnalysisError::Validation(format!("'{}' is not a well-formed URI", url)))
    }
}

/// Whether a cached verdict answers `request`.
///
/// Source credibility and checked sources depend on the URL, so only a verdict for the
/// same source is reused. A deep request needs a deep verdict.
fn reusable_for(cached: &AnalysisRecord, request: &AnalysisRequest) -> bool {
    cached.source_url == request.source_url
        && (request.mode == AnalysisMode::Quick || cached.analysis_type == AnalysisType::Deep)
}

/// Clamps the unit-interval scores a classifier reports.
fn normalize(mut classification: Classification) -> Classification {
    classification.prediction.confidence = clamp_unit(classification.prediction.confidence);
    classification.features.source_credibility =
        clamp_unit(classification.features.source_credibility);
    classification
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.5
    }
}
