//! Cross-crate scenarios: blocks are validated by the typed transaction
//! protocol against a transaction index, then committed to that index.

#[cfg(test)]
mod fixtures;

mod bot_registry;
mod erc20_bridge;
mod fees;
mod reorgs;
mod telemetry;
