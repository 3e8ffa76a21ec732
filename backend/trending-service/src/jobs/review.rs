use super::{JobContext, TrendsJob};
use crate::services::TrendingStatuses;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Periodic review pass over the unrestricted view.
pub struct ReviewJob {
    trends: Arc<TrendingStatuses>,
    interval_sec: u64,
}

impl ReviewJob {
    pub fn new(trends: Arc<TrendingStatuses>, interval_sec: u64) -> Self {
        Self {
            trends,
            interval_sec,
        }
    }
}

#[async_trait]
impl TrendsJob for ReviewJob {
    async fn run(&self, ctx: &JobContext) -> Result<()> {
        self.trends
            .request_review(ctx.at)
            .await
            .context("Trending review pass failed")?;
        Ok(())
    }

    fn interval_sec(&self) -> u64 {
        self.interval_sec
    }

    fn name(&self) -> &str {
        "trending_review"
    }
}
