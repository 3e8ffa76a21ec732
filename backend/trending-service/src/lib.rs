pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod notifier;
pub mod repository;
pub mod services;
pub mod store;

pub use config::{Config, TrendsConfig};
pub use error::{Result, TrendsError};
pub use models::{Account, Reviewer, Status, StatusId, Visibility};
pub use services::{ReviewSelector, StatusFilter, StatusQuery, TrendingScope, TrendingStatuses};
pub use store::{RankedStore, RankedView, RecentlyUsedLog};
