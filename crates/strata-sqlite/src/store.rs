use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use std::time::Instant;
use strata_core::{
    codec, observe, Namespace, Payload, Record, RecordBackend, Result, SqlConfig, StoreError,
    Upserted,
};

use crate::pool::{ConnectionPool, PooledConnection};
use crate::schema;

/// SQLite-backed record store
///
/// Payload fields are stored as codec-encoded BLOBs; the engine never looks
/// inside them. Safe to share between threads: each operation checks a
/// connection out of the pool for its duration.
pub struct SqliteRecordStore {
    pool: ConnectionPool,
}

impl SqliteRecordStore {
    /// Open the connection pool and verify the database is reachable
    pub fn open(config: SqlConfig) -> Result<Self> {
        Ok(Self {
            pool: ConnectionPool::open(config)?,
        })
    }

    /// Get the underlying pool (for custom queries)
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Release every pooled connection
    pub fn close(self) -> Result<()> {
        self.pool.close()
    }

    /// Check out a connection, failing with `Schema` if the table is absent
    fn present_connection(&self) -> Result<PooledConnection<'_>> {
        let conn = self.pool.acquire()?;
        if !schema::exists(&conn)? {
            return Err(StoreError::Schema(format!(
                "table {} does not exist",
                schema::TABLE
            )));
        }
        Ok(conn)
    }
}

/// Run an operation and report its outcome to the metrics hooks
fn timed<T>(op: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let started = Instant::now();
    let result = f();
    observe::record_operation(op, started.elapsed(), result.is_ok());
    result
}

fn map_write_err(context: &str, e: rusqlite::Error) -> StoreError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            StoreError::Constraint(format!("{}: {}", context, e))
        }
        _ => map_read_err(context, e),
    }
}

fn map_read_err(context: &str, e: rusqlite::Error) -> StoreError {
    // The table can vanish between the state check and the statement
    if e.to_string().contains("no such table") {
        StoreError::Schema(format!("{}: {}", context, e))
    } else {
        StoreError::Store(format!("{}: {}", context, e))
    }
}

fn encode_column(payload: Option<&Payload>) -> Result<Option<Vec<u8>>> {
    payload.map(codec::encode).transpose()
}

fn decode_column(id: &str, ns: Namespace, bytes: Option<Vec<u8>>) -> Result<Option<Payload>> {
    bytes
        .map(|bytes| {
            codec::decode(&bytes).map_err(|e| match e {
                StoreError::Decode(msg) => {
                    StoreError::Decode(format!("{} of record '{}': {}", ns.column(), id, msg))
                }
                other => other,
            })
        })
        .transpose()
}

/// A row as fetched, before payload decoding
struct StoredRow {
    id: String,
    primary: Option<Vec<u8>>,
    secondary: Option<Vec<u8>>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            primary: row.get(1)?,
            secondary: row.get(2)?,
        })
    }

    fn decode(self) -> Result<Record> {
        let primary_payload = decode_column(&self.id, Namespace::Primary, self.primary)?;
        let secondary_payload = decode_column(&self.id, Namespace::Secondary, self.secondary)?;
        Ok(Record {
            id: self.id,
            primary_payload,
            secondary_payload,
        })
    }
}

impl RecordBackend for SqliteRecordStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn create_table(&self) -> Result<()> {
        timed("create_table", || {
            let mut conn = self.pool.acquire()?;
            schema::create_table(&mut conn)?;
            tracing::info!(table = schema::TABLE, "Created table");
            Ok(())
        })
    }

    fn drop_table(&self) -> Result<()> {
        timed("drop_table", || {
            let conn = self.pool.acquire()?;
            schema::drop_table(&conn)?;
            tracing::info!(table = schema::TABLE, "Dropped table");
            Ok(())
        })
    }

    fn insert(&self, record: &Record) -> Result<()> {
        timed("insert", || {
            let primary = encode_column(record.primary_payload.as_ref())?;
            let secondary = encode_column(record.secondary_payload.as_ref())?;

            let conn = self.present_connection()?;
            conn.execute(schema::INSERT, params![record.id, primary, secondary])
                .map_err(|e| map_write_err(&format!("unable to insert '{}'", record.id), e))?;
            Ok(())
        })
    }

    fn read_all(&self) -> Result<Vec<Record>> {
        timed("read_all", || {
            let conn = self.present_connection()?;
            let mut stmt = conn
                .prepare(schema::SELECT_ALL)
                .map_err(|e| map_read_err("unable to select from table", e))?;
            let rows = stmt
                .query_map([], StoredRow::from_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| map_read_err("unable to scan rows", e))?;

            rows.into_iter().map(StoredRow::decode).collect()
        })
    }

    fn read_by_id(&self, id: &str) -> Result<Record> {
        timed("read_by_id", || {
            let conn = self.present_connection()?;
            let row = conn
                .query_row(schema::SELECT_BY_ID, [id], StoredRow::from_row)
                .optional()
                .map_err(|e| map_read_err(&format!("unable to select '{}'", id), e))?
                .ok_or_else(|| StoreError::NotFound(format!("record '{}'", id)))?;

            row.decode()
        })
    }

    fn upsert_by_namespace(&self, ns: Namespace, id: &str, payload: Payload) -> Result<Upserted> {
        timed("upsert_by_namespace", || {
            let encoded = codec::encode(&payload)?;

            let conn = self.present_connection()?;
            let changed = conn
                .execute(schema::upsert_statement(ns), params![id, encoded])
                .map_err(|e| map_write_err(&format!("unable to upsert {} of '{}'", ns, id), e))?;

            Ok(Upserted {
                payload,
                applied: changed > 0,
            })
        })
    }
}
