use super::{RankedStore, RankedView, RecentlyUsedLog, UsedBuckets};
use crate::error::Result;
use crate::models::StatusId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashSet;
use tracing::debug;

/// Redis-backed ranked views and recently-used log.
///
/// Ranked views are sorted sets; the log is one set per bucket plus a
/// sorted-set index of bucket starts so pruning never scans keys.
#[derive(Clone)]
pub struct RedisTrendStore {
    conn: ConnectionManager,
    key_prefix: String,
    buckets: UsedBuckets,
}

impl RedisTrendStore {
    const USED_SEGMENT: &'static str = "used";

    pub fn new(conn: ConnectionManager, key_prefix: &str, buckets: UsedBuckets) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.to_string(),
            buckets,
        }
    }

    fn view_key(&self, view: RankedView) -> String {
        format!("{}:{}", self.key_prefix, view.as_str())
    }

    fn bucket_key(&self, bucket: i64) -> String {
        format!("{}:{}:{}", self.key_prefix, Self::USED_SEGMENT, bucket)
    }

    fn bucket_index_key(&self) -> String {
        format!("{}:{}", self.key_prefix, Self::USED_SEGMENT)
    }
}

#[async_trait]
impl RankedStore for RedisTrendStore {
    async fn upsert(&self, view: RankedView, id: StatusId, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(self.view_key(view), id, score).await?;
        Ok(())
    }

    async fn remove(&self, view: RankedView, id: StatusId) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(self.view_key(view), id).await?;
        Ok(())
    }

    async fn top(&self, view: RankedView, limit: Option<usize>) -> Result<Vec<(StatusId, f64)>> {
        let stop = match limit {
            Some(0) => return Ok(Vec::new()),
            Some(n) => n as isize - 1,
            None => -1,
        };

        // ZREVRANGE {prefix}:{view} 0 {stop} WITHSCORES
        let mut conn = self.conn.clone();
        let members: Vec<(StatusId, f64)> = conn
            .zrevrange_withscores(self.view_key(view), 0, stop)
            .await?;
        Ok(members)
    }

    async fn score(&self, view: RankedView, id: StatusId) -> Result<Option<f64>> {
        let mut conn = self.conn.clone();
        let score: Option<f64> = conn.zscore(self.view_key(view), id).await?;
        Ok(score)
    }

    async fn rank(&self, view: RankedView, id: StatusId) -> Result<Option<usize>> {
        let mut conn = self.conn.clone();
        let rank: Option<usize> = conn.zrevrank(self.view_key(view), id).await?;
        Ok(rank)
    }

    async fn remove_below(&self, view: RankedView, min_score: f64) -> Result<usize> {
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .zrembyscore(self.view_key(view), "-inf", format!("({}", min_score))
            .await?;
        Ok(removed)
    }
}

#[async_trait]
impl RecentlyUsedLog for RedisTrendStore {
    async fn record(&self, id: StatusId, at: DateTime<Utc>) -> Result<()> {
        let bucket = self.buckets.bucket_start(at);
        let key = self.bucket_key(bucket);

        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .sadd(&key, id)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.buckets.ttl_secs())
            .ignore()
            .zadd(self.bucket_index_key(), bucket, bucket)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn recent_ids(&self, at: DateTime<Utc>) -> Result<HashSet<StatusId>> {
        let keys: Vec<String> = self
            .buckets
            .live_buckets(at)
            .into_iter()
            .map(|bucket| self.bucket_key(bucket))
            .collect();

        let mut conn = self.conn.clone();
        let ids: HashSet<StatusId> = conn.sunion(keys).await?;
        Ok(ids)
    }

    async fn prune(&self, at: DateTime<Utc>) -> Result<usize> {
        let index_key = self.bucket_index_key();
        let cutoff = self.buckets.expired_through(at);

        let mut conn = self.conn.clone();
        let expired: Vec<i64> = conn.zrangebyscore(&index_key, "-inf", cutoff).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = expired.iter().map(|b| self.bucket_key(*b)).collect();
        let _: () = redis::pipe()
            .del(keys)
            .ignore()
            .zrembyscore(&index_key, "-inf", cutoff)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(buckets = expired.len(), cutoff, "Pruned recently-used buckets");
        Ok(expired.len())
    }
}
