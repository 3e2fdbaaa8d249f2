//! Application layer containing the gateway orchestration.
//!
//! This module defines the `LiteCheckoutGateway`, the entry point for building
//! redirects, handling returns and notifications, and running merchant
//! operations. Each handler takes a per-order lock for its whole
//! read-modify-persist cycle.

pub mod gateway;
pub mod locks;
pub mod notify;
pub mod operations;
pub mod request;
pub mod returns;
