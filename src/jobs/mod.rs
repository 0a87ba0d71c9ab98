use crate::{context::AppContext, metrics};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::expired_token_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Purge expired emergency access tokens (interval from configuration)
    async fn expired_token_cleanup_job(scheduler: Arc<Self>) {
        let period = Duration::from_secs(scheduler.context.config.emergency.cleanup_interval_secs);
        let mut interval = interval(period);

        loop {
            interval.tick().await;
            info!("Running expired emergency token cleanup");

            let started = Instant::now();
            tasks::prune_rate_limiters(&scheduler.context);
            match tasks::cleanup_expired_tokens(&scheduler.context).await {
                Ok(count) => {
                    metrics::record_background_job(
                        "token_cleanup",
                        "success",
                        started.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Cleaned up {} expired emergency access tokens", count);
                    } else {
                        info!("Token cleanup: no expired tokens found");
                    }
                }
                Err(e) => {
                    metrics::record_background_job(
                        "token_cleanup",
                        "failure",
                        started.elapsed().as_secs_f64(),
                    );
                    error!("Failed to cleanup expired tokens: {}", e);
                }
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300)); // Every 5 minutes

        loop {
            interval.tick().await;

            let started = Instant::now();
            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    metrics::record_background_job(
                        "health_check",
                        "success",
                        started.elapsed().as_secs_f64(),
                    );
                }
                Err(e) => {
                    metrics::record_background_job(
                        "health_check",
                        "failure",
                        started.elapsed().as_secs_f64(),
                    );
                    error!("Health check failed: {}", e);
                }
            }
        }
    }
}
