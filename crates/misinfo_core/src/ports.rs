//! crates/misinfo_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the pipeline's collaborators.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the concrete classifier, database, feed, or identity provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AnalysisRecord, Classification, ClassificationLabel, ContentEvent, ContentFingerprint,
};
use crate::linguistics;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query Types
//=========================================================================================

/// Filters for the paginated history of one owner.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub classification: Option<ClassificationLabel>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &AnalysisRecord) -> bool {
        if let Some(label) = self.classification {
            if record.classification() != Some(label) {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.created_at > end {
                return false;
            }
        }
        true
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The pluggable classification box.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies a piece of content. Determinism across calls is not required.
    async fn classify(
        &self,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<Classification>;

    /// The extended pass used by deep analyses.
    ///
    /// Must return everything `classify` returns, plus linguistic features.
    async fn classify_deep(
        &self,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<Classification> {
        let mut classification = self.classify(content, source_url).await?;
        classification.features.linguistic_features = Some(linguistics::analyze(content));
        Ok(classification)
    }
}

/// Durable collection of analysis records.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert_analysis(&self, record: &AnalysisRecord) -> PortResult<()>;

    /// The most recent *completed* record with this fingerprint created at or after `since`.
    /// Copies that reuse an earlier verdict are skipped.
    async fn latest_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
        since: DateTime<Utc>,
    ) -> PortResult<Option<AnalysisRecord>>;

    /// All records of `owner_id` with `created_at` inside `[start, end]`.
    async fn analyses_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<AnalysisRecord>>;

    /// Returns `PortError::NotFound` when the record does not exist or belongs to someone else.
    async fn get_analysis(&self, owner_id: Uuid, id: Uuid) -> PortResult<AnalysisRecord>;

    /// One page of the owner's records, newest first, together with the total match count.
    async fn list_analyses(
        &self,
        owner_id: Uuid,
        filter: &HistoryFilter,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<AnalysisRecord>, u64)>;
}

/// Supplies content for the realtime monitor.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn next_event(&self) -> PortResult<ContentEvent>;
}

/// Resolves an opaque caller token to the owner it authenticates.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn resolve_owner(&self, token: &str) -> PortResult<Uuid>;
}
