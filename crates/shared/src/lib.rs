//! Shared utilities for the TableBook backend.
//!
//! This crate contains:
//! - Common validation helpers (guest details, dates, times)
//! - Token and booking-reference generation
//! - Hashing helpers for admin credentials

pub mod crypto;
pub mod tokens;
pub mod validation;
