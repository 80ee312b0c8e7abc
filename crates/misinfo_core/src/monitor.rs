//! crates/misinfo_core/src/monitor.rs
//!
//! The per-subscriber realtime monitor.
//!
//! A monitor belongs to exactly one connection. While monitoring it runs a single
//! background feed that, every tick, pulls an event from the `ContentSource`, runs it
//! through the engine, and pushes the result to the subscriber's channel. All feed
//! tokens are children of the connection's token, so closing or dropping the monitor
//! stops the feed even if `stop` was never called.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::AnalysisRecord;
use crate::engine::AnalysisEngine;
use crate::ports::ContentSource;

pub const DEFAULT_TICK: Duration = Duration::from_secs(3);

/// What the feed pushes to the subscriber.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// An analysed feed item and the platform it was observed on.
    Result {
        record: AnalysisRecord,
        source: String,
    },
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Monitoring,
    /// Terminal: the connection is gone.
    Stopped,
}

struct ActiveFeed {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct RealtimeMonitor {
    subscriber: Uuid,
    engine: Arc<AnalysisEngine>,
    source: Arc<dyn ContentSource>,
    period: Duration,
    outbound: mpsc::Sender<MonitorEvent>,
    connection: CancellationToken,
    active: Option<ActiveFeed>,
    state: MonitorState,
}

impl RealtimeMonitor {
    pub fn new(
        subscriber: Uuid,
        engine: Arc<AnalysisEngine>,
        source: Arc<dyn ContentSource>,
        period: Duration,
        outbound: mpsc::Sender<MonitorEvent>,
    ) -> Self {
        Self {
            subscriber,
            engine,
            source,
            period,
            outbound,
            connection: CancellationToken::new(),
            active: None,
            state: MonitorState::Idle,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Starts the feed. A running feed is replaced, never stacked.
    ///
    /// Returns `false` once the monitor has been closed.
    pub fn start(&mut self) -> bool {
        if self.state == MonitorState::Stopped {
            warn!(subscriber = %self.subscriber, "start requested on a closed monitor");
            return false;
        }
        if self.cancel_active() {
            debug!(subscriber = %self.subscriber, "replacing running feed");
        }

        let token = self.connection.child_token();
        let handle = tokio::spawn(run_feed(
            self.subscriber,
            self.engine.clone(),
            self.source.clone(),
            self.period,
            self.outbound.clone(),
            token.clone(),
        ));
        self.active = Some(ActiveFeed { token, handle });
        self.state = MonitorState::Monitoring;
        info!(
            subscriber = %self.subscriber,
            period_ms = self.period.as_millis() as u64,
            "monitoring started"
        );
        true
    }

    /// Stops the feed, returning `true` if one was running. The monitor can be started again.
    ///
    /// A tick already in flight may still deliver its result.
    pub fn stop(&mut self) -> bool {
        let was_running = self.cancel_active();
        if self.state == MonitorState::Monitoring {
            self.state = MonitorState::Idle;
        }
        if was_running {
            info!(subscriber = %self.subscriber, "monitoring stopped");
        }
        was_running
    }

    /// Tears the monitor down for good. Called on disconnect; `Drop` does the same.
    pub fn close(&mut self) {
        self.cancel_active();
        self.connection.cancel();
        self.state = MonitorState::Stopped;
    }

    fn cancel_active(&mut self) -> bool {
        match self.active.take() {
            Some(feed) => {
                feed.token.cancel();
                // The feed observes its token within one tick; the handle is only
                // kept so a finished feed is not mistaken for a running one.
                !feed.handle.is_finished()
            }
            None => false,
        }
    }
}

impl Drop for RealtimeMonitor {
    fn drop(&mut self) {
        self.connection.cancel();
    }
}

async fn run_feed(
    subscriber: Uuid,
    engine: Arc<AnalysisEngine>,
    source: Arc<dyn ContentSource>,
    period: Duration,
    outbound: mpsc::Sender<MonitorEvent>,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(%subscriber, "feed cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        let event = match source.next_event().await {
            Ok(content) => match engine.analyze_event(subscriber, &content).await {
                Ok(record) => MonitorEvent::Result {
                    record,
                    source: content.source,
                },
                Err(e) => {
                    warn!(%subscriber, event_id = %content.id, "feed analysis failed: {}", e);
                    MonitorEvent::Error(e.to_string())
                }
            },
            Err(e) => {
                warn!(%subscriber, "content source failed: {}", e);
                MonitorEvent::Error(format!("content source failed: {}", e))
            }
        };

        if outbound.send(event).await.is_err() {
            debug!(%subscriber, "subscriber channel closed, ending feed");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::test_support::{CyclingSource, ScriptedClassifier};
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::{sleep, timeout};

    const TICK: Duration = Duration::from_millis(25);

    fn monitor_with(
        items: Vec<&'static str>,
    ) -> (RealtimeMonitor, mpsc::Receiver<MonitorEvent>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let engine = Arc::new(AnalysisEngine::new(
            Arc::new(ScriptedClassifier::new()),
            store.clone(),
            chrono::Duration::hours(24),
        ));
        let (tx, rx) = mpsc::channel(64);
        let monitor = RealtimeMonitor::new(
            Uuid::new_v4(),
            engine,
            Arc::new(CyclingSource::new(items)),
            TICK,
            tx,
        );
        (monitor, rx, store)
    }

    fn headlines() -> Vec<&'static str> {
        vec![
            "Local weather forecast predicts sunny weekend ahead",
            "SHOCKING: This one weird trick doctors don't want you to know!",
        ]
    }

    #[tokio::test]
    async fn stop_ends_deliveries_within_the_grace_period() {
        let (mut monitor, mut rx, store) = monitor_with(headlines());
        assert!(monitor.start());
        assert_eq!(monitor.state(), MonitorState::Monitoring);

        let first = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        match first {
            MonitorEvent::Result { record, source } => {
                assert_eq!(record.analysis_type, crate::domain::AnalysisType::RealTime);
                assert_eq!(source, "test-feed");
            }
            other => panic!("expected a result, got {other:?}"),
        }

        assert!(monitor.stop());
        assert_eq!(monitor.state(), MonitorState::Idle);

        // Anything in flight at the moment of stopping lands within two ticks.
        sleep(TICK * 2).await;
        while rx.try_recv().is_ok() {}

        sleep(TICK * 6).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn second_start_replaces_the_feed() {
        let (mut monitor, mut rx, _) = monitor_with(headlines());
        monitor.start();
        monitor.start();

        sleep(TICK * 10).await;
        monitor.stop();
        let mut delivered = 0;
        while rx.try_recv().is_ok() {
            delivered += 1;
        }
        // A single feed fires at most ten times in ten periods; a stacked one would double that.
        assert!(delivered >= 1);
        assert!(delivered <= 11, "delivered {delivered}");
    }

    #[tokio::test]
    async fn monitor_can_restart_after_stop() {
        let (mut monitor, mut rx, _) = monitor_with(headlines());
        monitor.start();
        timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        monitor.stop();

        assert!(monitor.start());
        sleep(TICK * 2).await;
        let next = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(next.is_some());
    }

    #[tokio::test]
    async fn dropping_the_monitor_releases_the_feed() {
        let (mut monitor, mut rx, _) = monitor_with(headlines());
        monitor.start();
        timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        drop(monitor);

        // Once the feed task exits every sender is gone and the channel closes.
        let drained = timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn closed_monitor_refuses_to_start() {
        let (mut monitor, _rx, _) = monitor_with(headlines());
        monitor.close();
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert!(!monitor.start());
    }

    #[tokio::test]
    async fn analysis_failures_are_pushed_as_errors() {
        let (mut monitor, mut rx, _) =
            monitor_with(vec!["FAIL: this headline cannot be classified"]);
        monitor.start();
        let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(event, MonitorEvent::Error(_)));
        monitor.stop();
    }
}
