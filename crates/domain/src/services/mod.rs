//! Pure domain services.

pub mod availability;
pub mod events;
pub mod segments;
pub mod slots;
