use crate::error::Result;
use crate::types::{Namespace, Payload, Record};

/// Outcome of [`RecordBackend::upsert_by_namespace`]
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    /// The payload exactly as the caller supplied it
    pub payload: Payload,

    /// Whether a row was written
    pub applied: bool,
}

/// Storage engine for records
///
/// Every backend exposes the same capability set. A backend that cannot
/// perform an operation yet returns `StoreError::NotImplemented`, which
/// callers must not confuse with `Schema` or `NotFound`.
///
/// The table is either absent or present. `create_table` and `drop_table`
/// are the only transitions; every other operation requires a present table
/// and fails with `StoreError::Schema` otherwise. Schema changes must not
/// run concurrently with anything else.
pub trait RecordBackend: Send + Sync {
    /// Short backend name (for logs and diagnostics)
    fn name(&self) -> &'static str;

    /// Create the table and its unique id index
    fn create_table(&self) -> Result<()>;

    /// Drop the table and every record in it
    fn drop_table(&self) -> Result<()>;

    /// Insert a new record; fails with `Constraint` if the id exists
    fn insert(&self, record: &Record) -> Result<()>;

    /// Read every record, in the engine's natural scan order
    ///
    /// A single undecodable row fails the whole read.
    fn read_all(&self) -> Result<Vec<Record>>;

    /// Read one record; fails with `NotFound` on a miss
    fn read_by_id(&self, id: &str) -> Result<Record>;

    /// Insert a row holding `payload` in the namespace column, or replace
    /// that column if the id already exists
    fn upsert_by_namespace(&self, ns: Namespace, id: &str, payload: Payload) -> Result<Upserted>;
}
