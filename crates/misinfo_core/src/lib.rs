pub mod analytics;
pub mod batch;
pub mod cache;
pub mod domain;
pub mod engine;
pub mod error;
pub mod history;
pub mod linguistics;
pub mod memory;
pub mod monitor;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics::{AnalyticsAggregator, AnalyticsReport, TimeWindow, TrendBucket};
pub use batch::{
    BatchCoordinator, BatchItem, BatchOutcome, BatchReport, BatchResult, MAX_BATCH_ITEMS,
};
pub use cache::FingerprintCache;
pub use domain::{
    AnalysisMode, AnalysisRecord, AnalysisStatus, AnalysisType, Classification,
    ClassificationLabel, ContentEvent, ContentFingerprint, EmotionalTone,
};
pub use engine::{AnalysisEngine, AnalysisOutcome, AnalysisRequest};
pub use error::{AnalysisError, AnalysisResult, ErrorKind};
pub use history::{AnalysisHistory, HistoryPage, HistoryQuery};
pub use memory::InMemoryStore;
pub use monitor::{MonitorEvent, MonitorState, RealtimeMonitor};
pub use ports::{
    AnalysisStore, Classifier, ContentSource, HistoryFilter, IdentityService, PortError,
    PortResult,
};
