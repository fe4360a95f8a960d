//! Application layer orchestrating payment attempts.
//!
//! This module defines the `CheckoutService` which drives each order through
//! the attempt lifecycle, one order at a time.

pub mod checkout;
