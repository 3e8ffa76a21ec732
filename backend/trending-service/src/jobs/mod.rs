//! 后台任务模块
//!
//! Periodic passes over the trend stores:
//! - refresh: recompute decayed scores for every candidate
//! - review: flag unapproved statuses that would trend and email reviewers
//!
//! Each job runs in its own loop, so a job never overlaps itself. Failures are
//! logged and retried on the next tick; every pass recomputes from scratch.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};
use uuid::Uuid;

pub mod refresh;
pub mod review;

pub use refresh::RefreshJob;
pub use review::ReviewJob;

/// Per-tick execution context
#[derive(Debug, Clone)]
pub struct JobContext {
    pub correlation_id: String,
    /// Wall-clock time the pass computes against
    pub at: DateTime<Utc>,
}

impl JobContext {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            at,
        }
    }
}

#[async_trait]
pub trait TrendsJob: Send + Sync {
    async fn run(&self, ctx: &JobContext) -> Result<()>;

    /// 刷新间隔(秒)
    fn interval_sec(&self) -> u64;

    /// 任务名称(用于日志)
    fn name(&self) -> &str;
}

/// Backoff before the next tick after `consecutive_failures` failures in a row.
pub fn backoff_secs(consecutive_failures: u32) -> Option<u64> {
    if consecutive_failures >= 3 {
        Some(2u64.pow(consecutive_failures.min(5)))
    } else {
        None
    }
}

/// Sleep for `duration` unless shutdown arrives first. Returns true on shutdown.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.recv() => true,
    }
}

/// 运行单个 job 的定时循环
///
/// Ticks that fire while a pass is still running are skipped, not queued.
pub async fn run_job_loop(job: Arc<dyn TrendsJob>, mut shutdown: broadcast::Receiver<()>) {
    let mut interval_timer = interval(Duration::from_secs(job.interval_sec().max(1)));
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut consecutive_failures = 0u32;

    info!(
        job_name = %job.name(),
        interval_sec = job.interval_sec(),
        "Starting job loop"
    );

    loop {
        tokio::select! {
            _ = interval_timer.tick() => {
                let ctx = JobContext::new(Utc::now());
                let start = Instant::now();

                match job.run(&ctx).await {
                    Ok(()) => {
                        info!(
                            job_name = %job.name(),
                            correlation_id = %ctx.correlation_id,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Job pass completed"
                        );
                        if consecutive_failures > 0 {
                            info!(
                                job_name = %job.name(),
                                recovered_after = consecutive_failures,
                                "Job recovered after failures"
                            );
                            consecutive_failures = 0;
                        }
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        error!(
                            job_name = %job.name(),
                            correlation_id = %ctx.correlation_id,
                            error = %e,
                            consecutive_failures = consecutive_failures,
                            "Job execution failed, will retry on next interval"
                        );

                        if let Some(backoff) = backoff_secs(consecutive_failures) {
                            info!(
                                job_name = %job.name(),
                                backoff_secs = backoff,
                                "Applying exponential backoff due to consecutive failures"
                            );
                            let pause = Duration::from_secs(backoff);
                            if sleep_or_shutdown(pause, &mut shutdown).await {
                                info!(job_name = %job.name(), "Shutdown during backoff");
                                break;
                            }
                        }
                    }
                }
            }
            _ = shutdown.recv() => {
                info!(job_name = %job.name(), "Received shutdown signal, stopping job loop");
                break;
            }
        }
    }

    info!(job_name = %job.name(), "Job loop stopped");
}

/// Run every job in its own task until shutdown is broadcast.
pub async fn run_jobs(jobs: Vec<Arc<dyn TrendsJob>>, shutdown: broadcast::Sender<()>) {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(run_job_loop(job, shutdown_rx))
        })
        .collect();

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Job task panicked");
        }
    }
}
