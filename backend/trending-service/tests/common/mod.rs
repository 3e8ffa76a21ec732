#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use trending_service::{
    notifier::ReviewNotifier,
    repository::MemoryContentRepository,
    store::{MemoryTrendStore, UsedBuckets},
    Account, Result, Reviewer, Status, StatusId, TrendingStatuses, TrendsConfig, Visibility,
};

/// Notifier that keeps every delivered batch.
#[derive(Default)]
pub struct RecordingNotifier {
    pub deliveries: Mutex<Vec<(Reviewer, Vec<StatusId>)>>,
}

#[async_trait]
impl ReviewNotifier for RecordingNotifier {
    async fn notify(&self, reviewer: &Reviewer, batch: &[Status]) -> Result<()> {
        self.deliveries
            .lock()
            .await
            .push((reviewer.clone(), batch.iter().map(|s| s.id).collect()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryTrendStore>,
    pub repo: Arc<MemoryContentRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub trends: TrendingStatuses,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(TrendsConfig::default())
    }

    pub fn with_config(config: TrendsConfig) -> Self {
        let store = Arc::new(MemoryTrendStore::new(UsedBuckets::new(
            config.used_bucket_secs,
            config.used_retention_secs,
        )));
        let repo = Arc::new(MemoryContentRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let trends = TrendingStatuses::new(
            store.clone(),
            store.clone(),
            repo.clone(),
            notifier.clone(),
            &config,
        )
        .unwrap();

        Self {
            store,
            repo,
            notifier,
            trends,
        }
    }

    /// Store `status` and register one engagement event on it at `at`.
    pub async fn engage(&self, status: Status, at: DateTime<Utc>) {
        self.repo.insert(status.clone());
        self.trends.register(&status, at).await.unwrap();
    }

    pub async fn ids(&self, allowed: bool) -> Vec<StatusId> {
        self.trends.currently_trending_ids(allowed, -1).await.unwrap()
    }
}

pub fn account(id: i64) -> Account {
    Account {
        id,
        username: format!("user{}", id),
        discoverable: true,
        silenced: false,
        requested_review_at: None,
    }
}

/// Approved public status with `observed` engagement split across boosts and favourites.
pub fn status(id: StatusId, observed: i64, created_at: DateTime<Utc>) -> Status {
    Status {
        id,
        account: account(id + 1000),
        created_at,
        visibility: Visibility::Public,
        spoiler_text: String::new(),
        sensitive: false,
        in_reply_to_id: None,
        reblogs_count: observed / 2,
        favourites_count: observed - observed / 2,
        trendable: true,
        reblog: None,
    }
}

pub fn reviewer(id: i64) -> Reviewer {
    Reviewer {
        account_id: id,
        username: format!("mod{}", id),
        email: format!("mod{}@example.com", id),
    }
}
