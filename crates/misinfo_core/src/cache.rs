//! crates/misinfo_core/src/cache.rs
//!
//! The fingerprint cache: reuse of a recent completed analysis for identical content.
//!
//! Entries live in memory keyed by fingerprint and are admitted whenever the engine
//! persists a completed record. A memory miss falls back to the store, so a restart
//! does not forget analyses that are still fresh.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{AnalysisRecord, ContentFingerprint};
use crate::ports::AnalysisStore;

/// Past this many entries an admission also sweeps out expired ones.
const SWEEP_THRESHOLD: usize = 1024;

struct CacheEntry {
    record: Arc<AnalysisRecord>,
    expires_at: DateTime<Utc>,
}

pub struct FingerprintCache {
    store: Arc<dyn AnalysisStore>,
    freshness: Duration,
    entries: RwLock<HashMap<ContentFingerprint, CacheEntry>>,
}

impl FingerprintCache {
    pub fn new(store: Arc<dyn AnalysisStore>, freshness: Duration) -> Self {
        Self {
            store,
            freshness,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub async fn lookup(&self, fingerprint: &ContentFingerprint) -> Option<AnalysisRecord> {
        self.lookup_at(fingerprint, Utc::now()).await
    }

    /// Returns the newest completed record for `fingerprint` that is younger than the
    /// freshness window at `now`.
    ///
    /// A store failure is logged and reported as a miss; the caller then analyses afresh.
    pub async fn lookup_at(
        &self,
        fingerprint: &ContentFingerprint,
        now: DateTime<Utc>,
    ) -> Option<AnalysisRecord> {
        {
            let mut entries = self.entries.write().await;
            match entries.get(fingerprint) {
                Some(entry) if entry.expires_at > now => {
                    debug!(%fingerprint, "fingerprint cache hit (memory)");
                    return Some(entry.record.as_ref().clone());
                }
                Some(_) => {
                    debug!(%fingerprint, "evicting expired cache entry");
                    entries.remove(fingerprint);
                }
                None => {}
            }
        }

        let since = now - self.freshness;
        match self.store.latest_by_fingerprint(fingerprint, since).await {
            Ok(Some(record))
                if record.is_completed() && record.created_at + self.freshness > now =>
            {
                debug!(%fingerprint, "fingerprint cache hit (store)");
                self.admit_at(record.clone(), now).await;
                Some(record)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(%fingerprint, "cache lookup against the store failed: {}", e);
                None
            }
        }
    }

    /// Makes a persisted, completed record visible to later lookups.
    ///
    /// An older record never displaces a newer one for the same fingerprint.
    pub async fn admit(&self, record: AnalysisRecord) {
        self.admit_at(record, Utc::now()).await
    }

    async fn admit_at(&self, record: AnalysisRecord, now: DateTime<Utc>) {
        if !record.is_completed() {
            return;
        }
        let expires_at = record.created_at + self.freshness;
        if expires_at <= now {
            return;
        }

        let mut entries = self.entries.write().await;
        if entries.len() >= SWEEP_THRESHOLD {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        let newer_present = entries
            .get(&record.fingerprint)
            .is_some_and(|existing| existing.record.created_at > record.created_at);
        if !newer_present {
            entries.insert(
                record.fingerprint.clone(),
                CacheEntry {
                    record: Arc::new(record),
                    expires_at,
                },
            );
        }
    }
}
