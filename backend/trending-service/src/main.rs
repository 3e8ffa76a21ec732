use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};
use trending_service::{
    jobs::{run_jobs, RefreshJob, ReviewJob, TrendsJob},
    notifier::MailReviewNotifier,
    repository::PgContentRepository,
    store::{RedisTrendStore, UsedBuckets},
    Config, TrendingStatuses,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "trending_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let trends_config = config.trends.clone();

    info!(
        service = %config.service_name,
        threshold = trends_config.threshold,
        review_threshold = trends_config.review_threshold,
        halflife_secs = trends_config.score_halflife_secs,
        "Starting {}",
        config.service_name
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!(
        "Database pool initialized with {} max connections",
        config.database.max_connections
    );

    let redis_client =
        redis::Client::open(config.redis.url.clone()).context("Failed to create Redis client")?;
    let redis = redis::aio::ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis connection manager initialized");

    let notifier = MailReviewNotifier::new(&config.smtp).context("Failed to configure mailer")?;

    let store = Arc::new(RedisTrendStore::new(
        redis,
        &trends_config.key_prefix,
        UsedBuckets::new(
            trends_config.used_bucket_secs,
            trends_config.used_retention_secs,
        ),
    ));
    let trends = Arc::new(TrendingStatuses::new(
        store.clone(),
        store,
        Arc::new(PgContentRepository::new(db_pool)),
        Arc::new(notifier),
        &trends_config,
    )?);

    let jobs: Vec<Arc<dyn TrendsJob>> = vec![
        Arc::new(RefreshJob::new(
            trends.clone(),
            trends_config.refresh_interval_secs,
        )),
        Arc::new(ReviewJob::new(trends, trends_config.review_interval_secs)),
    ];

    let (shutdown_tx, _) = broadcast::channel(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = signal_tx.send(());
            }
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    run_jobs(jobs, shutdown_tx).await;

    info!("{} stopped", config.service_name);
    Ok(())
}
