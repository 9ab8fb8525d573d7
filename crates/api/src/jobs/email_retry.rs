//! Periodic email outbox sweep. Retries failed sends and picks up rows a
//! crashed process left in `pending`.

use sqlx::PgPool;

use crate::config::EmailConfig;
use crate::services::dispatcher::DispatcherService;

const BATCH_SIZE: i64 = 50;

pub struct EmailRetryJob {
    dispatcher: DispatcherService,
}

impl EmailRetryJob {
    pub fn new(pool: PgPool, email_config: EmailConfig) -> Self {
        Self {
            dispatcher: DispatcherService::new(pool, email_config),
        }
    }
}

#[async_trait::async_trait]
impl super::Job for EmailRetryJob {
    fn name(&self) -> &'static str {
        "email_retry"
    }

    fn frequency(&self) -> super::JobFrequency {
        super::JobFrequency::Minutes(5)
    }

    async fn execute(&self) -> Result<(), String> {
        let stats = self
            .dispatcher
            .process_retries(BATCH_SIZE)
            .await
            .map_err(|e| e.to_string())?;
        if stats.failed > 0 {
            return Err(format!(
                "{} of {} email deliveries failed",
                stats.failed, stats.processed
            ));
        }
        Ok(())
    }
}
