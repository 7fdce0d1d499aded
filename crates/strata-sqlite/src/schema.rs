//! Table layout and SQL statements for the entities table
//!
//! Every statement is a static string. Payload columns are only ever named
//! through [`Namespace`], so no caller text reaches the SQL.

use rusqlite::Connection;
use strata_core::{Namespace, Result, StoreError};

/// Name of the records table
pub const TABLE: &str = "entities";

pub const CREATE_TABLE: &str = "CREATE TABLE entities (
    id               VARCHAR(36) NOT NULL CHECK (length(id) <= 36),
    primaryPayload   BLOB NULL,
    secondaryPayload BLOB NULL
)";

pub const CREATE_INDEX: &str = "CREATE UNIQUE INDEX entities_id_idx ON entities (id)";

pub const DROP_TABLE: &str = "DROP TABLE entities";

pub const TABLE_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)";

pub const INSERT: &str =
    "INSERT INTO entities (id, primaryPayload, secondaryPayload) VALUES (?1, ?2, ?3)";

pub const SELECT_ALL: &str = "SELECT id, primaryPayload, secondaryPayload FROM entities";

pub const SELECT_BY_ID: &str =
    "SELECT id, primaryPayload, secondaryPayload FROM entities WHERE id = ?1";

/// Insert-or-update statement for one payload column
pub fn upsert_statement(ns: Namespace) -> &'static str {
    match ns {
        Namespace::Primary => {
            "INSERT INTO entities (id, primaryPayload) VALUES (?1, ?2)
             ON CONFLICT (id) DO UPDATE SET primaryPayload = excluded.primaryPayload"
        }
        Namespace::Secondary => {
            "INSERT INTO entities (id, secondaryPayload) VALUES (?1, ?2)
             ON CONFLICT (id) DO UPDATE SET secondaryPayload = excluded.secondaryPayload"
        }
    }
}

/// Whether the entities table is present
pub fn exists(conn: &Connection) -> Result<bool> {
    conn.query_row(TABLE_EXISTS, [TABLE], |row| row.get(0))
        .map_err(|e| StoreError::Store(format!("unable to inspect schema: {}", e)))
}

/// Create the table and its unique index
///
/// Both statements run in one transaction: if the index cannot be built the
/// table is rolled back too.
pub fn create_table(conn: &mut Connection) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|e| StoreError::Schema(format!("unable to begin transaction: {}", e)))?;

    tx.execute(CREATE_TABLE, [])
        .map_err(|e| StoreError::Schema(format!("unable to create table: {}", e)))?;
    tx.execute(CREATE_INDEX, [])
        .map_err(|e| StoreError::Schema(format!("unable to create index: {}", e)))?;

    tx.commit()
        .map_err(|e| StoreError::Schema(format!("unable to commit schema: {}", e)))
}

/// Drop the table, its index and all data
pub fn drop_table(conn: &Connection) -> Result<()> {
    conn.execute(DROP_TABLE, [])
        .map_err(|e| StoreError::Schema(format!("unable to drop table: {}", e)))?;
    Ok(())
}
