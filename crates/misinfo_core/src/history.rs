//! crates/misinfo_core/src/history.rs
//!
//! Owner-scoped reads of past analyses: filtered pages and single records.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::AnalysisRecord;
use crate::error::{AnalysisError, AnalysisResult};
use crate::ports::{AnalysisStore, HistoryFilter};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub filter: HistoryFilter,
    /// 1-based.
    pub page: u64,
    pub limit: u64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            filter: HistoryFilter::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub records: Vec<AnalysisRecord>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

pub struct AnalysisHistory {
    store: Arc<dyn AnalysisStore>,
}

impl AnalysisHistory {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    /// Newest-first page of the owner's analyses.
    pub async fn page(&self, owner_id: Uuid, query: HistoryQuery) -> AnalysisResult<HistoryPage> {
        if query.page == 0 {
            return Err(AnalysisError::Validation("page starts at 1".to_string()));
        }
        if query.limit == 0 || query.limit > MAX_PAGE_SIZE {
            return Err(AnalysisError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if let (Some(start), Some(end)) = (query.filter.start, query.filter.end) {
            if start > end {
                return Err(AnalysisError::Validation(
                    "startDate must not be after endDate".to_string(),
                ));
            }
        }

        let offset = (query.page - 1).saturating_mul(query.limit);
        let (records, total) = self
            .store
            .list_analyses(owner_id, &query.filter, offset, query.limit)
            .await
            .map_err(AnalysisError::from_store)?;

        Ok(HistoryPage {
            records,
            page: query.page,
            limit: query.limit,
            total,
            pages: total.div_ceil(query.limit),
        })
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> AnalysisResult<AnalysisRecord> {
        self.store
            .get_analysis(owner_id, id)
            .await
            .map_err(AnalysisError::from_store)
    }
}
