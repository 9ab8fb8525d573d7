//! HTTP route handlers.

pub mod admin_bookings;
pub mod admin_config;
pub mod admin_customers;
pub mod admin_deposits;
pub mod admin_jobs;
pub mod admin_notifications;
pub mod admin_service_periods;
pub mod availability;
pub mod bookings;
pub mod health;
