//! Business logic services.

pub mod booking;
pub mod deposits;
pub mod dispatcher;
pub mod email;
pub mod payments;
pub mod reconfirmation;

pub use booking::BookingService;
pub use deposits::DepositService;
pub use dispatcher::DispatcherService;
pub use email::EmailService;
pub use payments::{gateway_from_config, MockGateway, PaymentGateway, StripeGateway};
pub use reconfirmation::ReconfirmationService;
