use super::{RankedStore, RankedView, RecentlyUsedLog, UsedBuckets};
use crate::error::Result;
use crate::models::StatusId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

/// In-process implementation of both stores, for tests and local runs.
///
/// Ties in score are ordered by descending id.
pub struct MemoryTrendStore {
    views: DashMap<RankedView, HashMap<StatusId, f64>>,
    used: DashMap<i64, HashSet<StatusId>>,
    buckets: UsedBuckets,
}

impl MemoryTrendStore {
    pub fn new(buckets: UsedBuckets) -> Self {
        Self {
            views: DashMap::new(),
            used: DashMap::new(),
            buckets,
        }
    }

    /// Number of live log buckets, including ones not yet pruned.
    pub fn bucket_count(&self) -> usize {
        self.used.len()
    }

    fn sorted(&self, view: RankedView) -> Vec<(StatusId, f64)> {
        let mut members: Vec<(StatusId, f64)> = self
            .views
            .get(&view)
            .map(|members| members.iter().map(|(id, score)| (*id, *score)).collect())
            .unwrap_or_default();
        members.sort_by(|a, b| b.1.total_cmp(&a.1).then(b.0.cmp(&a.0)));
        members
    }
}

#[async_trait]
impl RankedStore for MemoryTrendStore {
    async fn upsert(&self, view: RankedView, id: StatusId, score: f64) -> Result<()> {
        self.views.entry(view).or_default().insert(id, score);
        Ok(())
    }

    async fn remove(&self, view: RankedView, id: StatusId) -> Result<()> {
        if let Some(mut members) = self.views.get_mut(&view) {
            members.remove(&id);
        }
        Ok(())
    }

    async fn top(&self, view: RankedView, limit: Option<usize>) -> Result<Vec<(StatusId, f64)>> {
        let mut members = self.sorted(view);
        if let Some(limit) = limit {
            members.truncate(limit);
        }
        Ok(members)
    }

    async fn score(&self, view: RankedView, id: StatusId) -> Result<Option<f64>> {
        Ok(self
            .views
            .get(&view)
            .and_then(|members| members.get(&id).copied()))
    }

    async fn rank(&self, view: RankedView, id: StatusId) -> Result<Option<usize>> {
        Ok(self
            .sorted(view)
            .iter()
            .position(|(member, _)| *member == id))
    }

    async fn remove_below(&self, view: RankedView, min_score: f64) -> Result<usize> {
        let Some(mut members) = self.views.get_mut(&view) else {
            return Ok(0);
        };
        let before = members.len();
        members.retain(|_, score| *score >= min_score);
        Ok(before - members.len())
    }
}

#[async_trait]
impl RecentlyUsedLog for MemoryTrendStore {
    async fn record(&self, id: StatusId, at: DateTime<Utc>) -> Result<()> {
        self.used
            .entry(self.buckets.bucket_start(at))
            .or_default()
            .insert(id);
        Ok(())
    }

    async fn recent_ids(&self, at: DateTime<Utc>) -> Result<HashSet<StatusId>> {
        let mut ids = HashSet::new();
        for bucket in self.buckets.live_buckets(at) {
            if let Some(members) = self.used.get(&bucket) {
                ids.extend(members.iter().copied());
            }
        }
        Ok(ids)
    }

    async fn prune(&self, at: DateTime<Utc>) -> Result<usize> {
        let before = self.used.len();
        self.used
            .retain(|bucket, _| !self.buckets.is_expired(*bucket, at));
        Ok(before - self.used.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> MemoryTrendStore {
        MemoryTrendStore::new(UsedBuckets::new(3600, 3600))
    }

    #[tokio::test]
    async fn test_top_orders_by_descending_score() {
        let store = store();
        store.upsert(RankedView::All, 1, 5.0).await.unwrap();
        store.upsert(RankedView::All, 2, 50.0).await.unwrap();
        store.upsert(RankedView::All, 3, 20.0).await.unwrap();

        let ids: Vec<StatusId> = store
            .top(RankedView::All, None)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(store.top(RankedView::All, Some(1)).await.unwrap(), vec![(2, 50.0)]);
        assert_eq!(store.rank(RankedView::All, 1).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_views_are_independent() {
        let store = store();
        store.upsert(RankedView::All, 1, 5.0).await.unwrap();
        assert_eq!(store.score(RankedView::Allowed, 1).await.unwrap(), None);
        assert!(store.top(RankedView::Allowed, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_and_remove_tolerates_absence() {
        let store = store();
        store.upsert(RankedView::All, 1, 5.0).await.unwrap();
        store.upsert(RankedView::All, 1, 9.0).await.unwrap();
        assert_eq!(store.score(RankedView::All, 1).await.unwrap(), Some(9.0));

        store.remove(RankedView::All, 1).await.unwrap();
        store.remove(RankedView::All, 1).await.unwrap();
        store.remove(RankedView::Allowed, 42).await.unwrap();
        assert_eq!(store.score(RankedView::All, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_below_is_strict() {
        let store = store();
        store.upsert(RankedView::All, 1, 0.3).await.unwrap();
        store.upsert(RankedView::All, 2, 0.29).await.unwrap();
        assert_eq!(store.remove_below(RankedView::All, 0.3).await.unwrap(), 1);
        assert_eq!(store.score(RankedView::All, 1).await.unwrap(), Some(0.3));
    }

    #[tokio::test]
    async fn test_recently_used_window_and_prune() {
        let store = store();
        let now = Utc::now();
        store.record(1, now - Duration::hours(5)).await.unwrap();
        store.record(2, now).await.unwrap();
        store.record(2, now).await.unwrap();

        let recent = store.recent_ids(now).await.unwrap();
        assert_eq!(recent, HashSet::from([2]));

        assert_eq!(store.prune(now).await.unwrap(), 1);
        assert_eq!(store.bucket_count(), 1);
    }
}
