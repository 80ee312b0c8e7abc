//! crates/misinfo_core/src/analytics.rs
//!
//! Windowed summary statistics over one owner's analysis history.
//!
//! Only completed records count. Trend buckets are UTC calendar days, sparse (days
//! without activity are omitted), and ascending by date.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{AnalysisRecord, ClassificationLabel};
use crate::error::{AnalysisError, AnalysisResult};
use crate::ports::AnalysisStore;

pub const TOP_SOURCES_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "24h" => Some(Self::Day),
            "7d" => Some(Self::Week),
            "30d" => Some(Self::Month),
            "90d" => Some(Self::Quarter),
            _ => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::Quarter => Duration::days(90),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub total_analyses: u64,
    pub misinformation_detected: u64,
    /// Arithmetic mean; zero for an empty window.
    pub avg_processing_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendBucket {
    pub date: NaiveDate,
    pub analyses_count: u64,
    pub misinformation_count: u64,
}

impl TrendBucket {
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationShare {
    pub classification: ClassificationLabel,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceStanding {
    pub source: String,
    pub analyses: u64,
    pub avg_credibility: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub window: TimeWindow,
    pub summary: AnalyticsSummary,
    pub trend: Vec<TrendBucket>,
    pub breakdown: Vec<ClassificationShare>,
    pub top_sources: Vec<SourceStanding>,
}

pub struct AnalyticsAggregator {
    store: Arc<dyn AnalysisStore>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    pub async fn summarize(
        &self,
        owner_id: Uuid,
        window: TimeWindow,
    ) -> AnalysisResult<AnalyticsReport> {
        self.summarize_at(owner_id, window, Utc::now()).await
    }

    /// Summarises the owner's records created inside `[now - window, now]`. Read-only.
    pub async fn summarize_at(
        &self,
        owner_id: Uuid,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> AnalysisResult<AnalyticsReport> {
        let records = self
            .store
            .analyses_between(owner_id, now - window.duration(), now)
            .await
            .map_err(AnalysisError::from_store)?;
        let completed: Vec<&AnalysisRecord> = records.iter().filter(|r| r.is_completed()).collect();
        Ok(aggregate(window, &completed))
    }
}

fn aggregate(window: TimeWindow, records: &[&AnalysisRecord]) -> AnalyticsReport {
    let total = records.len() as u64;
    let is_misinformation =
        |r: &AnalysisRecord| r.classification() == Some(ClassificationLabel::Misinformation);
    let misinformation = records.iter().filter(|r| is_misinformation(r)).count() as u64;
    let avg_processing_time_ms = if total == 0 {
        0.0
    } else {
        records.iter().map(|r| r.processing_time_ms as f64).sum::<f64>() / total as f64
    };

    let mut days: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.created_at.date_naive()).or_default();
        day.0 += 1;
        if is_misinformation(record) {
            day.1 += 1;
        }
    }
    let trend = days
        .into_iter()
        .map(|(date, (analyses_count, misinformation_count))| TrendBucket {
            date,
            analyses_count,
            misinformation_count,
        })
        .collect();

    AnalyticsReport {
        window,
        summary: AnalyticsSummary {
            total_analyses: total,
            misinformation_detected: misinformation,
            avg_processing_time_ms,
        },
        trend,
        breakdown: breakdown(records),
        top_sources: top_sources(records),
    }
}

fn breakdown(records: &[&AnalysisRecord]) -> Vec<ClassificationShare> {
    let mut counts: BTreeMap<ClassificationLabel, u64> = BTreeMap::new();
    for label in records.iter().filter_map(|r| r.classification()) {
        *counts.entry(label).or_default() += 1;
    }
    let total = records.len() as f64;
    let mut shares: Vec<ClassificationShare> = counts
        .into_iter()
        .map(|(classification, count)| ClassificationShare {
            classification,
            count,
            percentage: round1(count as f64 * 100.0 / total),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then(a.classification.cmp(&b.classification)));
    shares
}

fn top_sources(records: &[&AnalysisRecord]) -> Vec<SourceStanding> {
    let mut by_host: HashMap<String, (u64, f64)> = HashMap::new();
    for record in records {
        let (Some(url), Some(features)) =
            (record.source_url.as_deref(), record.features.as_ref())
        else {
            continue;
        };
        let Some(host) = source_host(url) else {
            continue;
        };
        let entry = by_host.entry(host).or_default();
        entry.0 += 1;
        entry.1 += features.source_credibility;
    }

    let mut standings: Vec<SourceStanding> = by_host
        .into_iter()
        .map(|(source, (analyses, credibility_sum))| SourceStanding {
            source,
            analyses,
            avg_credibility: credibility_sum / analyses as f64,
        })
        .collect();
    standings.sort_by(|a, b| {
        b.avg_credibility
            .partial_cmp(&a.avg_credibility)
            .unwrap_or(Ordering::Equal)
            .then(b.analyses.cmp(&a.analyses))
            .then(a.source.cmp(&b.source))
    });
    standings.truncate(TOP_SOURCES_LIMIT);
    standings
}

/// `https://user@news.example.com:443/a?b` -> `news.example.com:443`
pub fn source_host(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, rest)| rest)?;
    let authority = rest.split(|c: char| c == '/' || c == '?' || c == '#').next()?;
    let host = authority.rsplit('@').next()?.to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisRecord;
    use crate::memory::InMemoryStore;
    use crate::test_support::labelled_record;
    use chrono::TimeZone;

    fn sourced(mut record: AnalysisRecord, url: &str, credibility: f64) -> AnalysisRecord {
        record.source_url = Some(url.to_string());
        if let Some(features) = record.features.as_mut() {
            features.source_credibility = credibility;
        }
        record
    }

    #[tokio::test]
    async fn empty_window_yields_zeroes() {
        let aggregator = AnalyticsAggregator::new(Arc::new(InMemoryStore::new()));
        let report = aggregator.summarize(Uuid::new_v4(), TimeWindow::Week).await.unwrap();
        assert_eq!(report.summary.total_analyses, 0);
        assert_eq!(report.summary.misinformation_detected, 0);
        assert_eq!(report.summary.avg_processing_time_ms, 0.0);
        assert!(report.trend.is_empty());
        assert!(report.breakdown.is_empty());
        assert!(report.top_sources.is_empty());
    }

    #[tokio::test]
    async fn window_owner_and_daily_buckets() {
        let store = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();

        use ClassificationLabel::{Authentic, Misinformation};

        let two_days_ago = now - Duration::days(2);
        let mut a = labelled_record(owner, "first day, authentic", Authentic, two_days_ago);
        a.processing_time_ms = 100;
        let mut b = labelled_record(
            owner,
            "first day, misleading",
            Misinformation,
            two_days_ago + Duration::hours(1),
        );
        b.processing_time_ms = 300;
        let mut c =
            labelled_record(owner, "today, misleading", Misinformation, now - Duration::hours(1));
        c.processing_time_ms = 200;
        let outside =
            labelled_record(owner, "too old to count", Misinformation, now - Duration::days(8));
        let stranger = labelled_record(
            Uuid::new_v4(),
            "someone else",
            Misinformation,
            now - Duration::hours(2),
        );
        for record in [b, c, a, outside, stranger] {
            store.insert_record(record).await;
        }

        let aggregator = AnalyticsAggregator::new(store);
        let report = aggregator.summarize_at(owner, TimeWindow::Week, now).await.unwrap();

        assert_eq!(report.summary.total_analyses, 3);
        assert_eq!(report.summary.misinformation_detected, 2);
        assert_eq!(report.summary.avg_processing_time_ms, 200.0);
        let keys: Vec<String> = report.trend.iter().map(|b| b.date_key()).collect();
        assert_eq!(keys, ["2024-05-08", "2024-05-10"]);
        assert_eq!(report.trend[0].analyses_count, 2);
        assert_eq!(report.trend[0].misinformation_count, 1);
        assert_eq!(report.trend[1].misinformation_count, 1);

        assert_eq!(report.breakdown[0].classification, ClassificationLabel::Misinformation);
        assert_eq!(report.breakdown[0].count, 2);
        assert_eq!(report.breakdown[0].percentage, 66.7);
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let store = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let record = labelled_record(
            owner,
            "a single record",
            ClassificationLabel::Satire,
            now - Duration::hours(3),
        );
        store.insert_record(record).await;
        let aggregator = AnalyticsAggregator::new(store);

        let first = aggregator.summarize_at(owner, TimeWindow::Day, now).await.unwrap();
        let second = aggregator.summarize_at(owner, TimeWindow::Day, now).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn top_sources_rank_by_credibility() {
        let store = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let seeds = [
            ("https://news.gov/a", 0.9),
            ("https://news.gov/b", 0.7),
            ("http://rumours.example/x", 0.2),
            ("https://journal.edu/paper", 0.95),
        ];
        for (i, (url, credibility)) in seeds.into_iter().enumerate() {
            let record = labelled_record(
                owner,
                &format!("sourced record {i}"),
                ClassificationLabel::Authentic,
                now - Duration::minutes(5),
            );
            store.insert_record(sourced(record, url, credibility)).await;
        }

        let report = AnalyticsAggregator::new(store)
            .summarize_at(owner, TimeWindow::Day, now)
            .await
            .unwrap();
        let names: Vec<&str> = report.top_sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, ["journal.edu", "news.gov", "rumours.example"]);
        assert_eq!(report.top_sources[1].analyses, 2);
        assert!((report.top_sources[1].avg_credibility - 0.8).abs() < 1e-9);
    }

    #[test]
    fn host_extraction() {
        assert_eq!(
            source_host("https://user@News.Example.com:443/a?b").as_deref(),
            Some("news.example.com:443")
        );
        assert_eq!(source_host("https://example.com?x=1").as_deref(), Some("example.com"));
        assert_eq!(source_host("example.com"), None);
    }

    #[test]
    fn window_names_round_trip() {
        for w in [TimeWindow::Day, TimeWindow::Week, TimeWindow::Month, TimeWindow::Quarter] {
            assert_eq!(TimeWindow::parse(w.as_str()), Some(w));
        }
        assert_eq!(TimeWindow::parse("1y"), None);
    }
}
