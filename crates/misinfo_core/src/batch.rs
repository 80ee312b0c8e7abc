//! crates/misinfo_core/src/batch.rs
//!
//! Runs the engine over a bounded batch of items, isolating per-item failures.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AnalysisMode, AnalysisRecord};
use crate::engine::{AnalysisEngine, AnalysisRequest};
use crate::error::{AnalysisError, AnalysisResult, ErrorKind};

pub const MAX_BATCH_ITEMS: usize = 50;

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub item_id: String,
    pub content: String,
    pub source_url: Option<String>,
}

/// What happened to one item. Exactly one of record or error, by construction.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Completed {
        record: AnalysisRecord,
        from_cache: bool,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub item_id: String,
    pub outcome: BatchOutcome,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per input item, in input order.
    pub results: Vec<BatchResult>,
    pub summary: BatchSummary,
}

pub struct BatchCoordinator {
    engine: Arc<AnalysisEngine>,
    concurrency: usize,
}

impl BatchCoordinator {
    /// `concurrency` is the number of items analysed at once; zero is treated as one.
    pub fn new(engine: Arc<AnalysisEngine>, concurrency: usize) -> Self {
        Self {
            engine,
            concurrency: concurrency.max(1),
        }
    }

    /// Analyses every item in quick mode on behalf of `owner_id`.
    ///
    /// An empty or oversized batch is rejected before any item runs. Afterwards every
    /// item yields exactly one result; a failing item never aborts its siblings.
    pub async fn run_batch(
        &self,
        items: Vec<BatchItem>,
        owner_id: Uuid,
    ) -> AnalysisResult<BatchReport> {
        if items.is_empty() {
            return Err(AnalysisError::Validation(
                "batch must contain at least one item".to_string(),
            ));
        }
        if items.len() > MAX_BATCH_ITEMS {
            return Err(AnalysisError::Validation(format!(
                "batch holds {} items, the maximum is {}",
                items.len(),
                MAX_BATCH_ITEMS
            )));
        }

        let started = Instant::now();
        let total = items.len();
        info!(owner = %owner_id, total, "batch analysis started");

        // `buffered` keeps input order regardless of completion order.
        let results: Vec<BatchResult> = stream::iter(items)
            .map(|item| self.run_item(item, owner_id))
            .buffered(self.concurrency)
            .collect()
            .await;

        let successful = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total,
            successful,
            failed: total - successful,
            elapsed: started.elapsed(),
        };
        info!(
            owner = %owner_id,
            total,
            successful,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "batch analysis finished"
        );
        Ok(BatchReport { results, summary })
    }

    async fn run_item(&self, item: BatchItem, owner_id: Uuid) -> BatchResult {
        let request = AnalysisRequest {
            owner_id,
            content: item.content,
            source_url: item.source_url,
            mode: AnalysisMode::Quick,
        };
        let outcome = match self.engine.analyze(request).await {
            Ok(outcome) => BatchOutcome::Completed {
                record: outcome.record,
                from_cache: outcome.from_cache,
            },
            Err(e) => {
                warn!(item_id = %item.item_id, "batch item failed: {}", e);
                BatchOutcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        BatchResult {
            item_id: item.item_id,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::test_support::ScriptedClassifier;

    fn coordinator(classifier: Arc<ScriptedClassifier>, concurrency: usize) -> BatchCoordinator {
        let engine = AnalysisEngine::new(
            classifier,
            Arc::new(InMemoryStore::new()),
            chrono::Duration::hours(24),
        );
        BatchCoordinator::new(Arc::new(engine), concurrency)
    }

    fn item(id: &str, content: &str) -> BatchItem {
        BatchItem {
            item_id: id.to_string(),
            content: content.to_string(),
            source_url: None,
        }
    }

    #[tokio::test]
    async fn one_failing_item_does_not_abort_the_batch() {
        let batch = coordinator(Arc::new(ScriptedClassifier::new()), 3);
        let items = vec![
            item("item-1", "The first headline is plain."),
            item("item-2", "The second headline is plain."),
            item("item-3", "FAIL the third headline."),
            item("item-4", "The fourth headline is plain."),
            item("item-5", "The fifth headline is plain."),
        ];

        let report = batch.run_batch(items, Uuid::new_v4()).await.unwrap();

        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.successful, 4);
        assert_eq!(report.summary.failed, 1);
        let ids: Vec<&str> = report.results.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, ["item-1", "item-2", "item-3", "item-4", "item-5"]);
        match &report.results[2].outcome {
            BatchOutcome::Failed { kind, .. } => assert_eq!(*kind, ErrorKind::Classification),
            other => panic!("item-3 should have failed, got {other:?}"),
        }
        assert!(report.results.iter().enumerate().all(|(i, r)| r.is_success() == (i != 2)));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_wholesale() {
        let classifier = Arc::new(ScriptedClassifier::new());
        let batch = coordinator(classifier.clone(), 4);
        let items: Vec<BatchItem> = (0..=MAX_BATCH_ITEMS)
            .map(|i| item(&format!("item-{i}"), &format!("Headline number {i} for the batch.")))
            .collect();
        assert_eq!(items.len(), 51);

        let result = batch.run_batch(items, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AnalysisError::Validation(_))));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let batch = coordinator(Arc::new(ScriptedClassifier::new()), 4);
        let result = batch.run_batch(Vec::new(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AnalysisError::Validation(_))));
    }

    #[tokio::test]
    async fn invalid_item_becomes_a_validation_entry() {
        let batch = coordinator(Arc::new(ScriptedClassifier::new()), 1);
        let items = vec![item("short", "tiny"), item("ok", "A valid piece of content.")];

        let report = batch.run_batch(items, Uuid::new_v4()).await.unwrap();
        assert_eq!(report.summary.failed, 1);
        match &report.results[0].outcome {
            BatchOutcome::Failed { kind, .. } => assert_eq!(*kind, ErrorKind::Validation),
            other => panic!("expected a validation failure, got {other:?}"),
        }
        assert!(report.results[1].is_success());
    }
}
