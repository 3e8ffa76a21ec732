use super::{JobContext, TrendsJob};
use crate::services::TrendingStatuses;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Periodic recompute of both ranked views.
///
/// Holds a lock for the whole pass so that a manual trigger sharing the
/// lock can never interleave with a scheduled one.
pub struct RefreshJob {
    trends: Arc<TrendingStatuses>,
    lock: Arc<Mutex<()>>,
    interval_sec: u64,
}

impl RefreshJob {
    pub fn new(trends: Arc<TrendingStatuses>, interval_sec: u64) -> Self {
        Self {
            trends,
            lock: Arc::new(Mutex::new(())),
            interval_sec,
        }
    }

    pub fn with_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.lock = lock;
        self
    }
}

#[async_trait]
impl TrendsJob for RefreshJob {
    async fn run(&self, ctx: &JobContext) -> Result<()> {
        let Ok(_guard) = self.lock.try_lock() else {
            warn!(
                correlation_id = %ctx.correlation_id,
                "Previous trending refresh still running, skipping this tick"
            );
            return Ok(());
        };

        self.trends
            .refresh(ctx.at)
            .await
            .context("Trending refresh failed")?;
        Ok(())
    }

    fn interval_sec(&self) -> u64 {
        self.interval_sec
    }

    fn name(&self) -> &str {
        "trending_refresh"
    }
}
