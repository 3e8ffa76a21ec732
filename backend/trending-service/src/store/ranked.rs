use crate::error::Result;
use crate::models::StatusId;
use async_trait::async_trait;
use std::fmt;

/// Named ranked view. `Allowed` is always a filtered subset of `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankedView {
    All,
    Allowed,
}

impl RankedView {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankedView::All => "all",
            RankedView::Allowed => "allowed",
        }
    }

    pub fn for_allowed(allowed: bool) -> Self {
        if allowed {
            RankedView::Allowed
        } else {
            RankedView::All
        }
    }
}

impl fmt::Display for RankedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score store holding every named ranked view.
///
/// All mutations are idempotent and keyed by status id, so a pass that
/// dies halfway can simply be run again.
#[async_trait]
pub trait RankedStore: Send + Sync {
    /// Insert or overwrite the score of `id`.
    async fn upsert(&self, view: RankedView, id: StatusId, score: f64) -> Result<()>;

    /// Remove `id`; absent members are not an error.
    async fn remove(&self, view: RankedView, id: StatusId) -> Result<()>;

    /// Members by descending score. `None` returns the whole view.
    ///
    /// Ties keep the backend's own ordering; callers must not rely on it.
    async fn top(&self, view: RankedView, limit: Option<usize>) -> Result<Vec<(StatusId, f64)>>;

    async fn score(&self, view: RankedView, id: StatusId) -> Result<Option<f64>>;

    /// 0-based position in descending-score order.
    async fn rank(&self, view: RankedView, id: StatusId) -> Result<Option<usize>>;

    /// Drop every member scoring strictly below `min_score`, returning how many went.
    async fn remove_below(&self, view: RankedView, min_score: f64) -> Result<usize>;
}
