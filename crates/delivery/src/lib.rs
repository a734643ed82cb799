//! Lead delivery to the external webhook.
//!
//! A validated lead is formatted once, then handed to an ordered list of
//! strategies. The first strategy that does not fail ends the sequence; if all
//! fail the payload is parked in the pending cache for a manual retry.

pub mod config;
pub mod dispatcher;
pub mod payload;
pub mod pending;
pub mod strategy;

pub use config::*;
pub use dispatcher::*;
pub use payload::*;
pub use pending::*;
pub use strategy::*;
