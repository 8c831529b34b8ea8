//! On-disk schema identification.

use std::fmt;

/// Stored under the internal header key of every index.
pub const DATABASE_HEADER: &str = "Transaction Database";

/// Schema versions, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Mint conditions only; stats without chain time.
    V1_0,
    /// Adds the bot buckets and chain time in the stats.
    V1_1,
    /// Adds the ERC20 buckets.
    V1_2,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V1_2;

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1_0 => "1.0",
            SchemaVersion::V1_1 => "1.1",
            SchemaVersion::V1_2 => "1.2",
        }
    }

    pub fn parse(version: &str) -> Option<Self> {
        match version {
            "1.0" => Some(SchemaVersion::V1_0),
            "1.1" => Some(SchemaVersion::V1_1),
            "1.2" => Some(SchemaVersion::V1_2),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_ordered() {
        assert!(SchemaVersion::V1_0 < SchemaVersion::V1_1);
        assert!(SchemaVersion::V1_1 < SchemaVersion::CURRENT);
        assert_eq!(SchemaVersion::parse("1.1"), Some(SchemaVersion::V1_1));
        assert_eq!(SchemaVersion::parse("2.0"), None);
    }
}
