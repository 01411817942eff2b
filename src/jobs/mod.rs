use crate::{context::AppContext, error::GymResult, metrics};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);
const MEMBERSHIP_EXPIRY_INTERVAL: Duration = Duration::from_secs(86400);

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

        tokio::spawn(Self::expired_session_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::membership_expiry_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Cleanup expired sessions and reset tokens (runs every hour)
    async fn expired_session_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(SESSION_CLEANUP_INTERVAL);

        loop {
            interval.tick().await;

            match timed("session_cleanup", tasks::cleanup_expired_sessions(&scheduler.context)).await {
                Ok(count) if count > 0 => info!("Cleaned up {} expired sessions and reset tokens", count),
                Ok(_) => {}
                Err(e) => error!("Failed to cleanup expired sessions: {}", e),
            }
        }
    }

    /// Deactivate lapsed memberships (runs daily, first run at startup)
    async fn membership_expiry_job(scheduler: Arc<Self>) {
        let mut interval = interval(MEMBERSHIP_EXPIRY_INTERVAL);

        loop {
            interval.tick().await;
            info!("Running membership expiry");

            match timed("membership_expiry", tasks::expire_memberships(&scheduler.context)).await {
                Ok(count) if count > 0 => info!("Marked {} members inactive", count),
                Ok(_) => info!("Membership expiry: nothing lapsed"),
                Err(e) => error!("Failed to expire memberships: {}", e),
            }
        }
    }
}

/// Run a job body and record its outcome and duration
async fn timed<T>(job_type: &str, job: impl Future<Output = GymResult<T>>) -> GymResult<T> {
    let started = Instant::now();
    let result = job.await;
    let status = if result.is_ok() { "success" } else { "failure" };
    metrics::record_background_job(job_type, status, started.elapsed().as_secs_f64());
    result
}
