//! Ports of the transaction index.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
