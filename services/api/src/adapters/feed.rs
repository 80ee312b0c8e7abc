//! services/api/src/adapters/feed.rs
//!
//! A simulated social feed implementing the `ContentSource` port. It rotates
//! through a fixed set of headlines, alternating between two platforms.

use async_trait::async_trait;
use chrono::Utc;
use misinfo_core::domain::ContentEvent;
use misinfo_core::ports::{ContentSource, PortResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

const HEADLINES: &[&str] = &[
    "Breaking: New scientific study reveals important findings about climate change",
    "SHOCKING: This one weird trick doctors don't want you to know!",
    "Local weather forecast predicts sunny weekend ahead",
    "URGENT: Government conspiracy exposed by anonymous whistleblower",
    "University researchers publish peer-reviewed study on renewable energy",
    "Miracle cure discovered by local doctor - FDA doesn't want you to know!",
    "Stock market update: Tech companies show strong growth",
    "Celebrity scandal rocks social media with explosive allegations",
];

const PLATFORMS: &[&str] = &["Twitter", "Facebook"];

#[derive(Default)]
pub struct SimulatedFeed {
    cursor: AtomicUsize,
}

impl SimulatedFeed {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentSource for SimulatedFeed {
    async fn next_event(&self) -> PortResult<ContentEvent> {
        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(ContentEvent {
            id: Uuid::new_v4().simple().to_string(),
            content: HEADLINES[n % HEADLINES.len()].to_string(),
            source: PLATFORMS[n % PLATFORMS.len()].to_string(),
            observed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rotates_through_every_headline() {
        let feed = SimulatedFeed::new();
        let mut seen = Vec::new();
        for _ in 0..HEADLINES.len() {
            seen.push(feed.next_event().await.unwrap().content);
        }
        assert_eq!(seen, HEADLINES);

        let wrapped = feed.next_event().await.unwrap();
        assert_eq!(wrapped.content, HEADLINES[0]);
        assert!(PLATFORMS.contains(&wrapped.source.as_str()));
    }
}
