//! Test doubles shared by the core's unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::domain::{
    AnalysisRecord, AnalysisSubject, AnalysisType, Classification, ClassificationLabel,
    ContentEvent, ContentFeatures, ContentFingerprint, EmotionalTone, Prediction, Verification,
};
use crate::memory::InMemoryStore;
use crate::ports::{
    AnalysisStore, Classifier, ContentSource, HistoryFilter, PortError, PortResult,
};

/// Fails on any content containing `FAIL`, labels `Miracle`/`SHOCKING` as
/// misinformation, everything else as authentic. Counts its calls.
pub struct ScriptedClassifier {
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        content: &str,
        source_url: Option<&str>,
    ) -> PortResult<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content.contains("FAIL") {
            return Err(PortError::Unexpected("scripted classifier failure".to_string()));
        }
        let label = if content.contains("Miracle") || content.contains("SHOCKING") {
            ClassificationLabel::Misinformation
        } else {
            ClassificationLabel::Authentic
        };
        Ok(classification(label, source_url))
    }
}

pub fn classification(label: ClassificationLabel, source_url: Option<&str>) -> Classification {
    Classification {
        prediction: Prediction {
            classification: label,
            confidence: 0.8,
            reasoning: "scripted".to_string(),
            model_version: "scripted-v1".to_string(),
        },
        features: ContentFeatures {
            source_credibility: 0.5,
            language_patterns: BTreeSet::from(["scripted".to_string()]),
            emotional_tone: EmotionalTone::Neutral,
            risk_factors: Vec::new(),
            linguistic_features: None,
        },
        verification: Verification {
            sources_checked: source_url.map(str::to_string).into_iter().collect(),
            ..Default::default()
        },
    }
}

pub fn labelled_record(
    owner_id: Uuid,
    content: &str,
    label: ClassificationLabel,
    created_at: DateTime<Utc>,
) -> AnalysisRecord {
    let subject = AnalysisSubject {
        owner_id,
        content: content.to_string(),
        fingerprint: ContentFingerprint::of(content),
        source_url: None,
        analysis_type: AnalysisType::Quick,
    };
    AnalysisRecord::completed(subject, classification(label, None), 100, created_at)
}

pub fn completed_record(
    owner_id: Uuid,
    content: &str,
    created_at: DateTime<Utc>,
) -> AnalysisRecord {
    labelled_record(owner_id, content, ClassificationLabel::Authentic, created_at)
}

/// An in-memory store whose writes can be switched to fail.
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisStore for FlakyStore {
    async fn insert_analysis(&self, record: &AnalysisRecord) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("store unavailable".to_string()));
        }
        self.inner.insert_analysis(record).await
    }

    async fn latest_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
        since: DateTime<Utc>,
    ) -> PortResult<Option<AnalysisRecord>> {
        self.inner.latest_by_fingerprint(fingerprint, since).await
    }

    async fn analyses_between(
        &self,
        owner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<AnalysisRecord>> {
        self.inner.analyses_between(owner_id, start, end).await
    }

    async fn get_analysis(&self, owner_id: Uuid, id: Uuid) -> PortResult<AnalysisRecord> {
        self.inner.get_analysis(owner_id, id).await
    }

    async fn list_analyses(
        &self,
        owner_id: Uuid,
        filter: &HistoryFilter,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<AnalysisRecord>, u64)> {
        self.inner.list_analyses(owner_id, filter, offset, limit).await
    }
}

/// Cycles through a fixed list of headlines.
pub struct CyclingSource {
    items: Vec<&'static str>,
    next: AtomicUsize,
}

impl CyclingSource {
    pub fn new(items: Vec<&'static str>) -> Self {
        Self {
            items,
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentSource for CyclingSource {
    async fn next_event(&self) -> PortResult<ContentEvent> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let content = self.items[n % self.items.len()];
        Ok(ContentEvent {
            id: format!("evt-{n}"),
            content: content.to_string(),
            source: "test-feed".to_string(),
            observed_at: Utc::now(),
        })
    }
}
