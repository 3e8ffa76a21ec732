use crate::error::Result;
use crate::models::StatusId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Append-only log of statuses that saw engagement, grouped in time buckets.
///
/// Its only job is to bound the refresh candidate set; expiry happens a
/// bucket at a time.
#[async_trait]
pub trait RecentlyUsedLog: Send + Sync {
    /// Record `id` in the bucket covering `at`. Recording twice is a no-op.
    async fn record(&self, id: StatusId, at: DateTime<Utc>) -> Result<()>;

    /// Union of ids recorded in buckets overlapping the retention window ending at `at`.
    async fn recent_ids(&self, at: DateTime<Utc>) -> Result<HashSet<StatusId>>;

    /// Drop buckets that ended before the retention window. Returns buckets removed.
    async fn prune(&self, at: DateTime<Utc>) -> Result<usize>;
}

/// Bucket arithmetic shared by every log backend.
///
/// A bucket starting at `s` covers `[s, s + width)`. It is live at `at`
/// while it overlaps `[at - retention, at]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedBuckets {
    width_secs: i64,
    retention_secs: i64,
}

impl UsedBuckets {
    pub fn new(width_secs: u64, retention_secs: u64) -> Self {
        Self {
            width_secs: width_secs.max(1) as i64,
            retention_secs: retention_secs as i64,
        }
    }

    pub fn bucket_start(&self, at: DateTime<Utc>) -> i64 {
        self.start_of(at.timestamp())
    }

    fn start_of(&self, ts: i64) -> i64 {
        ts.div_euclid(self.width_secs) * self.width_secs
    }

    /// Start of every bucket overlapping the retention window, oldest first.
    pub fn live_buckets(&self, at: DateTime<Utc>) -> Vec<i64> {
        let first = self.start_of(at.timestamp() - self.retention_secs);
        let last = self.bucket_start(at);
        (0..)
            .map(|n| first + n * self.width_secs)
            .take_while(|start| *start <= last)
            .collect()
    }

    /// Latest bucket start that is fully outside the retention window.
    pub fn expired_through(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp() - self.retention_secs - self.width_secs
    }

    pub fn is_expired(&self, bucket: i64, at: DateTime<Utc>) -> bool {
        bucket <= self.expired_through(at)
    }

    /// Backstop TTL for backends that expire keys on their own.
    pub fn ttl_secs(&self) -> i64 {
        self.retention_secs + self.width_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn test_bucket_start_floors_to_width() {
        let buckets = UsedBuckets::new(3600, 7200);
        assert_eq!(buckets.bucket_start(at(7199)), 3600);
        assert_eq!(buckets.bucket_start(at(7200)), 7200);
    }

    #[test]
    fn test_live_buckets_cover_window() {
        let buckets = UsedBuckets::new(3600, 7200);
        // window [3000, 10200] touches buckets 0, 3600, 7200
        assert_eq!(buckets.live_buckets(at(10_200)), vec![0, 3600, 7200]);
    }

    #[test]
    fn test_expiry_matches_live_set() {
        let buckets = UsedBuckets::new(3600, 7200);
        let now = at(14_400);
        let live = buckets.live_buckets(now);
        assert_eq!(live, vec![7200, 10_800, 14_400]);
        assert!(buckets.is_expired(3600, now));
        assert!(!buckets.is_expired(7200, now));
    }

    #[test]
    fn test_ttl_spans_retention_and_width() {
        assert_eq!(UsedBuckets::new(86_400, 86_400).ttl_secs(), 172_800);
    }
}
