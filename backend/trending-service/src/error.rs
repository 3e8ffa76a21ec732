use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrendsError>;

#[derive(Debug, Error)]
pub enum TrendsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<envy::Error> for TrendsError {
    fn from(err: envy::Error) -> Self {
        TrendsError::Config(err.to_string())
    }
}
