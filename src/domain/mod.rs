//! Domain layer: the payment attempt lifecycle and the rules it enforces.
//!
//! Everything here is transport-agnostic; the gateway is reached only
//! through the traits in [`ports`].

pub mod attempt;
pub mod card;
pub mod category;
pub mod gateway;
pub mod installments;
pub mod money;
pub mod order;
pub mod ports;
pub mod receipt;
