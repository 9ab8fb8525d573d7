//! Daily reconfirmation sweep job.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::reconfirmation::ReconfirmationService;

pub struct ReconfirmationSweepJob {
    service: ReconfirmationService,
}

impl ReconfirmationSweepJob {
    pub fn new(pool: PgPool, config: Arc<Config>) -> Self {
        Self {
            service: ReconfirmationService::new(pool, config),
        }
    }
}

#[async_trait::async_trait]
impl super::Job for ReconfirmationSweepJob {
    fn name(&self) -> &'static str {
        "reconfirmation_sweep"
    }

    fn frequency(&self) -> super::JobFrequency {
        super::JobFrequency::Daily
    }

    async fn execute(&self) -> Result<(), String> {
        let outcome = self.service.run_sweep().await.map_err(|e| e.to_string())?;
        if outcome.failed > 0 {
            return Err(format!(
                "{} sweep steps failed: {}",
                outcome.failed,
                outcome.errors.join("; ")
            ));
        }
        Ok(())
    }
}
