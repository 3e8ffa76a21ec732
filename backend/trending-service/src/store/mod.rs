// ============================================
// Trend Stores
// ============================================
//
// Two pieces of shared state back the trend engine:
// 1. Ranked views: status id -> decayed score, queried by descending rank
// 2. Recently-used log: which statuses saw engagement in each time bucket
//
// Both sit behind traits so the ranker runs unchanged against Redis in
// production and against in-memory maps in tests.
//
// Redis keys:
// - {prefix}:all / {prefix}:allowed - Sorted sets of status id by score
// - {prefix}:used:{bucket}          - Set of status ids touched in a bucket
// - {prefix}:used                   - Sorted set indexing live bucket starts

pub mod memory;
pub mod ranked;
pub mod recently_used;
pub mod redis;

pub use memory::MemoryTrendStore;
pub use ranked::{RankedStore, RankedView};
pub use recently_used::{RecentlyUsedLog, UsedBuckets};
pub use self::redis::RedisTrendStore;
