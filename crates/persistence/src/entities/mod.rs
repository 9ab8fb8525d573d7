//! Entity definitions (database row mappings).

pub mod booking;
pub mod booking_config;
pub mod customer;
pub mod deposit_transaction;
pub mod email_log;
pub mod notification;
pub mod service_period;

pub use booking::BookingEntity;
pub use booking_config::BookingConfigEntity;
pub use customer::CustomerEntity;
pub use deposit_transaction::DepositTransactionEntity;
pub use email_log::{EmailLogEntity, EMAIL_MAX_ATTEMPTS, EMAIL_STUCK_AFTER_SECS};
pub use notification::NotificationEntity;
pub use service_period::ServicePeriodEntity;
