//! Background jobs and their scheduler.

mod email_retry;
mod reconfirmation_sweep;
mod scheduler;

pub use email_retry::EmailRetryJob;
pub use reconfirmation_sweep::ReconfirmationSweepJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
