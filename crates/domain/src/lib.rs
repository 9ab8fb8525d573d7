//! Domain layer for the TableBook reservation backend.
//!
//! This crate contains:
//! - Domain models (ServicePeriod, BookingConfig, Booking, Customer, Deposit)
//! - Pure business services (slot generation, availability rules, segmentation)
//! - Domain events emitted by booking transitions

pub mod models;
pub mod services;
