//! Domain model definitions.

pub mod booking;
pub mod booking_config;
pub mod customer;
pub mod deposit;
pub mod email;
pub mod notification;
pub mod service_period;

pub use booking::{Booking, BookingStatus};
pub use booking_config::{BookingConfig, CapacityPolicy, UpdateBookingConfigRequest};
pub use customer::{Customer, CustomerSegment};
pub use deposit::{DepositAction, DepositStatus};
pub use notification::{Notification, NotificationPriority, NotificationType};
pub use service_period::{PeriodType, ServicePeriod};
