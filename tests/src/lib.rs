//! # Threefold-Chain Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Protocol validation against the live index
//!     ├── fixtures.rs   # In-memory chain harness
//!     ├── bot_registry.rs
//!     ├── erc20_bridge.rs
//!     ├── fees.rs
//!     ├── reorgs.rs
//!     └── telemetry.rs
//!
//! tests/benches/
//! └── index_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tc-tests
//! cargo test -p tc-tests integration::reorgs
//! cargo bench -p tc-tests
//! ```

pub mod integration;
