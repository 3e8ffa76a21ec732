use crate::error::{Result, TrendsError};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    pub redis: RedisConfig,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub trends: TrendsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Empty host puts the review mailer in no-op mode
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_smtp_from")]
    pub from: String,
    #[serde(default = "default_true")]
    pub use_starttls: bool,
    #[serde(default = "default_admin_base_url")]
    pub admin_base_url: String,
}

/// Scoring and scheduling options, read from `TRENDS_*`.
///
/// Unknown `TRENDS_` variables are rejected so that a misspelt option
/// fails at startup instead of silently falling back to a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendsConfig {
    /// Minimum observed engagement before a status scores at all
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Rank (1-based) an unapproved status must beat to be sent for review
    #[serde(default = "default_review_threshold")]
    pub review_threshold: u32,
    #[serde(default = "default_score_halflife_secs")]
    pub score_halflife_secs: u64,
    #[serde(default = "default_used_bucket_secs")]
    pub used_bucket_secs: u64,
    #[serde(default = "default_used_retention_secs")]
    pub used_retention_secs: u64,
    /// Scores below this are trimmed from both views after a refresh
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_review_interval_secs")]
    pub review_interval_secs: u64,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            review_threshold: default_review_threshold(),
            score_halflife_secs: default_score_halflife_secs(),
            used_bucket_secs: default_used_bucket_secs(),
            used_retention_secs: default_used_retention_secs(),
            min_score: default_min_score(),
            key_prefix: default_key_prefix(),
            refresh_interval_secs: default_refresh_interval_secs(),
            review_interval_secs: default_review_interval_secs(),
        }
    }
}

impl TrendsConfig {
    pub fn from_env() -> Result<Self> {
        let config: TrendsConfig = envy::prefixed("TRENDS_").from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.score_halflife_secs == 0 {
            return Err(TrendsError::Config(
                "TRENDS_SCORE_HALFLIFE_SECS must be greater than zero".to_string(),
            ));
        }
        if self.review_threshold == 0 {
            return Err(TrendsError::Config(
                "TRENDS_REVIEW_THRESHOLD must be at least 1".to_string(),
            ));
        }
        if self.used_bucket_secs == 0 || self.used_retention_secs == 0 {
            return Err(TrendsError::Config(
                "TRENDS_USED_BUCKET_SECS and TRENDS_USED_RETENTION_SECS must be greater than zero"
                    .to_string(),
            ));
        }
        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(TrendsError::Config(
                "TRENDS_MIN_SCORE must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "trending-service".to_string()),
            redis: envy::prefixed("REDIS_").from_env()?,
            database: envy::prefixed("DATABASE_").from_env()?,
            smtp: envy::prefixed("SMTP_").from_env()?,
            trends: TrendsConfig::from_env()?,
        })
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "trends@localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_admin_base_url() -> String {
    "http://localhost:3000/admin/trends/statuses".to_string()
}

fn default_threshold() -> u32 {
    5
}

fn default_review_threshold() -> u32 {
    3
}

fn default_score_halflife_secs() -> u64 {
    8 * 3600
}

fn default_used_bucket_secs() -> u64 {
    86_400
}

fn default_used_retention_secs() -> u64 {
    86_400
}

fn default_min_score() -> f64 {
    0.3
}

fn default_key_prefix() -> String {
    "trending_statuses".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_review_interval_secs() -> u64 {
    3600
}
