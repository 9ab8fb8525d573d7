//! Repository implementations.

pub mod booking;
pub mod booking_config;
pub mod customer;
pub mod deposit_transaction;
pub mod email_log;
pub mod notification;
pub mod service_period;

pub use booking::{BookingRepository, CustomerUpsert, NewBooking};
pub use booking_config::{BookingConfigPatch, BookingConfigRepository};
pub use customer::CustomerRepository;
pub use deposit_transaction::DepositTransactionRepository;
pub use email_log::EmailLogRepository;
pub use notification::NotificationRepository;
pub use service_period::{NewServicePeriod, ServicePeriodPatch, ServicePeriodRepository};
