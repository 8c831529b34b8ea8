//! # Domain Layer
//!
//! Stored shapes of the index: key layout, stats, schema versions and the
//! journals that make reverts exact.

pub mod errors;
pub mod journal;
pub mod keys;
pub mod schema;
pub mod stats;

pub use errors::{IndexError, KVStoreError, LookupError};
pub use journal::{DisplacedNames, ImplicitUpdate};
pub use keys::KeyPrefix;
pub use schema::{SchemaVersion, DATABASE_HEADER};
pub use stats::IndexStats;
