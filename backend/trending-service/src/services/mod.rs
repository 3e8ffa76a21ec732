pub mod eligibility;
pub mod filter;
pub mod ranker;
pub mod retrieval;
pub mod review;
pub mod scoring;

pub use eligibility::is_eligible;
pub use filter::{StatusFilter, StatusQuery, TrendingScope};
pub use ranker::{RefreshStats, TrendingStatuses};
pub use retrieval::fetch_in_order;
pub use review::{ReviewSelector, ReviewStats};
pub use scoring::{score_at_rank, ScoreCalculator};
