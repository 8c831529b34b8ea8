//! # Ports Layer
//!
//! - **Inbound**: the protocol API consumed by consensus and wallets
//! - **Outbound**: registries and the bridge validator the protocol consults

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
