use super::ContentRepository;
use crate::error::Result;
use crate::models::{AccountId, Reviewer, Status, StatusId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Repository kept entirely in memory.
///
/// Counts bulk fetches so callers can assert a path issued none.
#[derive(Default)]
pub struct MemoryContentRepository {
    statuses: DashMap<StatusId, Status>,
    reviewers: DashMap<AccountId, Reviewer>,
    fetches: AtomicUsize,
}

impl MemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, status: Status) {
        self.statuses.insert(status.id, status);
    }

    pub fn delete(&self, id: StatusId) -> Option<Status> {
        self.statuses.remove(&id).map(|(_, status)| status)
    }

    pub fn update<F>(&self, id: StatusId, f: F)
    where
        F: FnOnce(&mut Status),
    {
        if let Some(mut status) = self.statuses.get_mut(&id) {
            f(&mut status);
        }
    }

    pub fn status(&self, id: StatusId) -> Option<Status> {
        self.statuses.get(&id).map(|status| status.clone())
    }

    pub fn add_reviewer(&self, reviewer: Reviewer) {
        self.reviewers.insert(reviewer.account_id, reviewer);
    }

    pub fn bulk_fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn flag_account(&self, account_id: AccountId, at: DateTime<Utc>) {
        for mut entry in self.statuses.iter_mut() {
            if entry.account.id == account_id && entry.account.requested_review_at.is_none() {
                entry.account.requested_review_at = Some(at);
            }
        }
    }
}

#[async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn find_statuses(&self, ids: &[StatusId]) -> Result<Vec<Status>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.statuses.get(id).map(|status| status.clone()))
            .collect())
    }

    async fn mark_review_requested(&self, status: &Status, at: DateTime<Utc>) -> Result<()> {
        self.flag_account(status.account.id, at);
        Ok(())
    }

    async fn trend_reviewers(&self) -> Result<Vec<Reviewer>> {
        Ok(self
            .reviewers
            .iter()
            .map(|reviewer| reviewer.value().clone())
            .collect())
    }
}
