use anyhow::Result;
use std::time::Instant;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::MaintenanceConfig;
use crate::db::Store;

/// Background housekeeping. Currently purges expired bearer tokens and
/// admin grants.
pub struct Scheduler {
    store: Store,
    config: MaintenanceConfig,
}

impl Scheduler {
    #[must_use]
    pub const fn new(store: Store, config: MaintenanceConfig) -> Self {
        Self { store, config }
    }

    /// Starts the cron jobs. `None` when maintenance is disabled.
    pub async fn start(&self) -> Result<Option<JobScheduler>> {
        if !self.config.enabled {
            info!("Maintenance scheduler is disabled in config");
            return Ok(None);
        }

        let sched = JobScheduler::new().await?;

        let store = self.store.clone();
        let job = Job::new_async(self.config.token_purge_cron.as_str(), move |_uuid, _lock| {
            let store = store.clone();
            Box::pin(async move {
                let start = Instant::now();
                info!(event = "job_started", job_name = "purge_tokens", "Purging expired tokens");

                match purge_expired_tokens(&store).await {
                    Ok(removed) => info!(
                        event = "job_finished",
                        job_name = "purge_tokens",
                        removed,
                        duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Expired tokens purged"
                    ),
                    Err(e) => error!(
                        event = "job_failed",
                        job_name = "purge_tokens",
                        error = %e,
                        "Token purge failed"
                    ),
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Token purge scheduled: {}", self.config.token_purge_cron);
        Ok(Some(sched))
    }

    pub async fn run_once(&self) -> Result<u64> {
        purge_expired_tokens(&self.store).await
    }
}

async fn purge_expired_tokens(store: &Store) -> Result<u64> {
    let removed = store.token_repo().purge_expired().await?;
    metrics::counter!("expired_tokens_purged_total").increment(removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TokenScope;
    use chrono::Duration;

    #[tokio::test]
    async fn test_run_once_purges_only_expired_tokens() {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1).await.unwrap();
        let user = store
            .user_repo()
            .create("Ada", "ada@x.com", "hash".to_string())
            .await
            .unwrap();

        let tokens = store.token_repo();
        let stale = tokens
            .issue(user.id, TokenScope::Session, Duration::hours(-1))
            .await
            .unwrap();
        let live = tokens
            .issue(user.id, TokenScope::Admin, Duration::hours(1))
            .await
            .unwrap();

        let scheduler = Scheduler::new(
            store.clone(),
            MaintenanceConfig {
                enabled: false,
                ..MaintenanceConfig::default()
            },
        );

        assert!(scheduler.start().await.unwrap().is_none());
        assert_eq!(scheduler.run_once().await.unwrap(), 1);
        assert_eq!(
            tokens.resolve(&stale.token, TokenScope::Session).await.unwrap(),
            None
        );
        assert_eq!(
            tokens.resolve(&live.token, TokenScope::Admin).await.unwrap(),
            Some(user.id)
        );
    }
}
