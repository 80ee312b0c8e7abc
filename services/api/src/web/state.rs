//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use misinfo_core::{
    AnalysisEngine, AnalysisHistory, AnalysisStore, AnalyticsAggregator, BatchCoordinator,
    Classifier, ContentSource, IdentityService,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<AnalysisEngine>,
    pub batch: Arc<BatchCoordinator>,
    pub history: Arc<AnalysisHistory>,
    pub analytics: Arc<AnalyticsAggregator>,
    pub identity: Arc<dyn IdentityService>,
    /// Shared by every realtime connection; each connection runs its own monitor over it.
    pub source: Arc<dyn ContentSource>,
}

impl AppState {
    /// Wires the pipeline components around one classifier and one store.
    pub fn assemble(
        config: Arc<Config>,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn AnalysisStore>,
        identity: Arc<dyn IdentityService>,
        source: Arc<dyn ContentSource>,
    ) -> Self {
        let engine = Arc::new(AnalysisEngine::new(
            classifier,
            store.clone(),
            config.cache_freshness,
        ));
        let batch = Arc::new(BatchCoordinator::new(engine.clone(), config.batch_concurrency));
        Self {
            history: Arc::new(AnalysisHistory::new(store.clone())),
            analytics: Arc::new(AnalyticsAggregator::new(store)),
            engine,
            batch,
            identity,
            source,
            config,
        }
    }
}
