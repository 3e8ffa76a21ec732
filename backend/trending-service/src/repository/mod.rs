// ============================================
// Content Repository
// ============================================
//
// The trend engine never owns statuses. It reads immutable snapshots in
// bulk, flags owners whose content was sent for review, and asks who the
// reviewers are. Everything else about content lives in the repository.

pub mod memory;
pub mod postgres;

pub use memory::MemoryContentRepository;
pub use postgres::PgContentRepository;

use crate::error::Result;
use crate::models::{Reviewer, Status, StatusId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Bulk fetch. Ids that no longer resolve are simply absent; order is unspecified.
    async fn find_statuses(&self, ids: &[StatusId]) -> Result<Vec<Status>>;

    /// Record that `status` has been sent to reviewers.
    async fn mark_review_requested(&self, status: &Status, at: DateTime<Utc>) -> Result<()>;

    /// Staff members who opted into trending review emails.
    async fn trend_reviewers(&self) -> Result<Vec<Reviewer>>;
}
