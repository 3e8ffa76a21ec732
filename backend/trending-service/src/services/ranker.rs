// ============================================
// Trending Statuses (熱門貼文排行)
// ============================================
//
// Write path: engagement event -> eligibility gate -> recently-used log.
// Refresh path (periodic, never overlapping):
// 1. Candidates = recently-used ids ∪ ids already in "all"
// 2. Bulk fetch snapshots, compute decayed scores
// 3. Zero -> remove from both views; otherwise overwrite "all" and
//    add to / remove from "allowed" by approval and discoverability
// 4. Ids that no longer resolve leave both views
// 5. Trim low scores, prune expired log buckets
// Read path: ranked ids -> order-preserving bulk fetch.

use super::eligibility::is_eligible;
use super::retrieval::fetch_in_order;
use super::review::{ReviewSelector, ReviewStats};
use super::scoring::ScoreCalculator;
use crate::config::TrendsConfig;
use crate::error::Result;
use crate::models::{Status, StatusId};
use crate::notifier::ReviewNotifier;
use crate::repository::ContentRepository;
use crate::store::{RankedStore, RankedView, RecentlyUsedLog};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub candidates: usize,
    pub resolved: usize,
    pub upserted: usize,
    pub allowed: usize,
    pub removed: usize,
    /// Candidates that no longer resolve to a status
    pub vanished: usize,
    pub trimmed: usize,
    pub pruned_buckets: usize,
}

pub struct TrendingStatuses {
    store: Arc<dyn RankedStore>,
    used: Arc<dyn RecentlyUsedLog>,
    repository: Arc<dyn ContentRepository>,
    calculator: ScoreCalculator,
    min_score: f64,
    review: ReviewSelector,
}

impl TrendingStatuses {
    pub fn new(
        store: Arc<dyn RankedStore>,
        used: Arc<dyn RecentlyUsedLog>,
        repository: Arc<dyn ContentRepository>,
        notifier: Arc<dyn ReviewNotifier>,
        config: &TrendsConfig,
    ) -> Result<Self> {
        config.validate()?;

        let review = ReviewSelector::new(
            store.clone(),
            repository.clone(),
            notifier,
            config.review_threshold,
        );

        Ok(Self {
            store,
            used,
            repository,
            calculator: ScoreCalculator::from_config(config),
            min_score: config.min_score,
            review,
        })
    }

    /// Record an engagement event on `status` at `at`.
    ///
    /// Reblogs count toward the original. Ineligible events are dropped.
    pub async fn register(&self, status: &Status, at: DateTime<Utc>) -> Result<()> {
        let proper = status.proper();
        if !is_eligible(proper, &proper.account) {
            debug!(status_id = proper.id, "Ignoring engagement on ineligible status");
            return Ok(());
        }

        self.used.record(proper.id, at).await
    }

    /// Recompute every candidate's score from scratch as of `at`.
    ///
    /// Safe to re-run after a failure; callers must not run two at once.
    pub async fn refresh(&self, at: DateTime<Utc>) -> Result<RefreshStats> {
        let started = Instant::now();

        let mut candidates: HashSet<StatusId> = self.used.recent_ids(at).await?;
        candidates.extend(self.currently_trending_ids(false, -1).await?);
        let mut ids: Vec<StatusId> = candidates.into_iter().collect();
        ids.sort_unstable();

        let mut stats = RefreshStats {
            candidates: ids.len(),
            ..Default::default()
        };

        let statuses = if ids.is_empty() {
            Vec::new()
        } else {
            self.repository.find_statuses(&ids).await?
        };
        stats.resolved = statuses.len();

        let resolved: HashSet<StatusId> = statuses.iter().map(|status| status.id).collect();
        for &id in ids.iter().filter(|id| !resolved.contains(id)) {
            self.store.remove(RankedView::All, id).await?;
            self.store.remove(RankedView::Allowed, id).await?;
            stats.vanished += 1;
        }

        for status in &statuses {
            let score = self.calculator.decayed_score(status, at);

            if score == 0.0 {
                self.store.remove(RankedView::All, status.id).await?;
                self.store.remove(RankedView::Allowed, status.id).await?;
                stats.removed += 1;
                continue;
            }

            self.store.upsert(RankedView::All, status.id, score).await?;
            stats.upserted += 1;

            if status.trendable && status.account.discoverable {
                self.store.upsert(RankedView::Allowed, status.id, score).await?;
                stats.allowed += 1;
            } else {
                self.store.remove(RankedView::Allowed, status.id).await?;
            }
        }

        stats.trimmed = self.trim_low_scores().await?;
        stats.pruned_buckets = self.used.prune(at).await?;

        info!(
            candidates = stats.candidates,
            resolved = stats.resolved,
            upserted = stats.upserted,
            allowed = stats.allowed,
            removed = stats.removed,
            vanished = stats.vanished,
            trimmed = stats.trimmed,
            pruned_buckets = stats.pruned_buckets,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trending statuses refreshed"
        );

        Ok(stats)
    }

    async fn trim_low_scores(&self) -> Result<usize> {
        let mut trimmed = self
            .store
            .remove_below(RankedView::All, self.min_score)
            .await?;
        trimmed += self
            .store
            .remove_below(RankedView::Allowed, self.min_score)
            .await?;
        Ok(trimmed)
    }

    /// Ranked ids, best first. A negative `limit` means no limit.
    pub async fn currently_trending_ids(&self, allowed: bool, limit: i64) -> Result<Vec<StatusId>> {
        let limit = usize::try_from(limit).ok();
        Ok(self
            .store
            .top(RankedView::for_allowed(allowed), limit)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// Ranked statuses, best first, skipping any that no longer resolve.
    pub async fn get(&self, allowed: bool, limit: i64) -> Result<Vec<Status>> {
        let ids = self.currently_trending_ids(allowed, limit).await?;
        self.fetch_ordered(&ids).await
    }

    pub async fn fetch_ordered(&self, ids: &[StatusId]) -> Result<Vec<Status>> {
        fetch_in_order(self.repository.as_ref(), ids).await
    }

    /// Current score in the unrestricted view, 0 when not trending.
    pub async fn score(&self, id: StatusId) -> Result<f64> {
        Ok(self
            .store
            .score(RankedView::All, id)
            .await?
            .unwrap_or(0.0))
    }

    /// 0-based position among approved trending statuses.
    pub async fn rank(&self, id: StatusId) -> Result<Option<usize>> {
        self.store.rank(RankedView::Allowed, id).await
    }

    pub async fn request_review(&self, at: DateTime<Utc>) -> Result<ReviewStats> {
        self.review.request_review(at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrendsError;
    use crate::notifier::MockReviewNotifier;
    use crate::repository::MemoryContentRepository;
    use crate::store::{MemoryTrendStore, UsedBuckets};

    fn build(config: &TrendsConfig) -> Result<TrendingStatuses> {
        let store = Arc::new(MemoryTrendStore::new(UsedBuckets::new(3600, 3600)));
        TrendingStatuses::new(
            store.clone(),
            store,
            Arc::new(MemoryContentRepository::new()),
            Arc::new(MockReviewNotifier::new()),
            config,
        )
    }

    #[test]
    fn test_rejects_zero_halflife() {
        let config = TrendsConfig {
            score_halflife_secs: 0,
            ..TrendsConfig::default()
        };
        assert!(matches!(build(&config), Err(TrendsError::Config(_))));
    }

    #[test]
    fn test_accepts_default_config() {
        assert!(build(&TrendsConfig::default()).is_ok());
    }
}
