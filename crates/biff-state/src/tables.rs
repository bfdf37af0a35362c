//! redb table definitions for the enrollment store.

use redb::TableDefinition;

/// Enrollment records keyed by store-assigned id. Ids only grow, so key
/// order is insertion order.
pub const ENROLLMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("enrollments");

/// Unique index: node key → enrollment id.
pub const NODE_KEYS: TableDefinition<&str, u64> = TableDefinition::new("node_keys");
