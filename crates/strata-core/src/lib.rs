//! Strata Core: types, codec and traits for the strata record store
//!
//! Strata stores schema-flexible records (an id plus two semi-structured
//! payloads) in a relational table, keeping each payload as an opaque
//! MessagePack blob instead of native columns.
//!
//! This crate holds everything that is independent of a concrete engine:
//! - Payload values and records
//! - The binary payload codec
//! - The backend trait every storage engine implements
//! - Configuration and the error taxonomy

pub mod codec;
pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use config::{SqlConfig, SynchronousMode, WideColumnConfig};
pub use error::{Result, StoreError};
pub use traits::{RecordBackend, Upserted};
pub use types::{Namespace, Payload, Record, Value, MAX_DEPTH, MAX_ID_LEN};
