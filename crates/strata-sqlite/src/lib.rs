//! SQLite-backed record store implementation
//!
//! Stores records in a single `entities` table whose payload columns hold
//! codec-encoded BLOBs.
//!
//! Key features:
//! - Blocking connection pool with open/idle/lifetime limits
//! - Liveness check on open
//! - Create-table and index applied atomically
//! - Column-targeted upserts through a closed set of namespaces

pub mod pool;
pub mod schema;
pub mod store;

pub use pool::{ConnectionPool, PoolStats, PooledConnection};
pub use store::SqliteRecordStore;
