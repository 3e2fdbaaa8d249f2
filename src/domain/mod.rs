//! Domain layer: payment lifecycle rules and the collaborator ports.

pub mod message;
pub mod money;
pub mod order;
pub mod payment;
pub mod ports;
pub mod protocol;
pub mod refund;
pub mod state_machine;
