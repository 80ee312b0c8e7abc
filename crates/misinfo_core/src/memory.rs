//! crates/misinfo_core/src/memory.rs
//!
//! In-memory `AnalysisStore` for tests and database-less deployments.
//!
//! Records live in a `Vec` behind a `tokio::sync::RwLock`; every query is a linear scan.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AnalysisRecord, ContentFingerprint};
use crate::ports::{AnalysisStore, HistoryFilter, PortError, PortResult};

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<AnalysisRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, bypassing the engine. Handy for seeding.
    pub async fn insert_record(&self, record: AnalysisRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn insert_analysis(&self, record: &AnalysisRecord) -> PortResult<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(PortError::Unexpected(format!(
                "analysis {} already exists",
                record.id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn latest_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
        since: DateTime<Utc>,
    ) -> PortResult<Option<AnalysisRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| {
                &r.fingerprint == fingerprint
                    && r.is_completed()
                    && r.reused_from.is_none()
                    && r.created_at >= since
            })
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn analyses_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<AnalysisRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<AnalysisRecord> = records
            .iter()
            .filter(|r| r.owner_id == owner_id && r.created_at >= start && r.created_at <= end)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }

    async fn get_analysis(&self, owner_id: Uuid, id: Uuid) -> PortResult<AnalysisRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Analysis {} not found", id)))
    }

    async fn list_analyses(
        &self,
        owner_id: Uuid,
        filter: &HistoryFilter,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<AnalysisRecord>, u64)> {
        let records = self.records.read().await;
        let mut matching: Vec<&AnalysisRecord> = records
            .iter()
            .filter(|r| r.owner_id == owner_id && filter.matches(r))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
