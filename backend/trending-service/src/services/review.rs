use super::scoring::score_at_rank;
use crate::error::Result;
use crate::models::{AccountId, Status};
use crate::notifier::ReviewNotifier;
use crate::repository::ContentRepository;
use crate::store::{RankedStore, RankedView};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one review pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewStats {
    pub candidates: usize,
    /// Score an unapproved status had to beat
    pub cutoff: f64,
    pub flagged: usize,
    pub reviewers_notified: usize,
    pub delivery_failures: usize,
}

/// Flags unapproved statuses that would trend at the stricter review rank.
///
/// A status is flagged at most once, ever: the flag is written through to
/// the repository and flagged statuses are skipped on every later pass.
pub struct ReviewSelector {
    store: Arc<dyn RankedStore>,
    repository: Arc<dyn ContentRepository>,
    notifier: Arc<dyn ReviewNotifier>,
    review_threshold: u32,
}

impl ReviewSelector {
    pub fn new(
        store: Arc<dyn RankedStore>,
        repository: Arc<dyn ContentRepository>,
        notifier: Arc<dyn ReviewNotifier>,
        review_threshold: u32,
    ) -> Self {
        Self {
            store,
            repository,
            notifier,
            review_threshold,
        }
    }

    /// Score at the review rank in the unrestricted view.
    pub async fn cutoff(&self) -> Result<f64> {
        let rank = self.review_threshold.saturating_sub(1) as usize;
        score_at_rank(self.store.as_ref(), RankedView::All, rank).await
    }

    pub async fn request_review(&self, at: DateTime<Utc>) -> Result<ReviewStats> {
        let ids: Vec<_> = self
            .store
            .top(RankedView::All, None)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        let mut stats = ReviewStats {
            candidates: ids.len(),
            ..Default::default()
        };
        if ids.is_empty() {
            return Ok(stats);
        }

        let statuses = self.repository.find_statuses(&ids).await?;
        stats.cutoff = self.cutoff().await?;

        // snapshots predate this pass's marks; the flag is per owner
        let mut flagged_owners: HashSet<AccountId> = HashSet::new();
        let mut batch: Vec<Status> = Vec::new();
        for status in statuses {
            if status.trendable
                || status.review_requested()
                || flagged_owners.contains(&status.account.id)
            {
                continue;
            }

            let score = self
                .store
                .score(RankedView::All, status.id)
                .await?
                .unwrap_or(0.0);
            if score <= stats.cutoff {
                continue;
            }

            self.repository.mark_review_requested(&status, at).await?;
            flagged_owners.insert(status.account.id);
            debug!(
                status_id = status.id,
                score,
                cutoff = stats.cutoff,
                "Status flagged for review"
            );
            batch.push(status);
        }

        stats.flagged = batch.len();
        if batch.is_empty() {
            return Ok(stats);
        }

        for reviewer in self.repository.trend_reviewers().await? {
            match self.notifier.notify(&reviewer, &batch).await {
                Ok(()) => stats.reviewers_notified += 1,
                Err(e) => {
                    stats.delivery_failures += 1;
                    warn!(
                        reviewer = %reviewer.username,
                        error = %e,
                        "Failed to deliver trending review notification"
                    );
                }
            }
        }

        info!(
            candidates = stats.candidates,
            flagged = stats.flagged,
            reviewers = stats.reviewers_notified,
            "Trending review pass completed"
        );

        Ok(stats)
    }
}
