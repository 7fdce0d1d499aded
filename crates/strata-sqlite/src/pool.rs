//! SQLite Connection Pool
//!
//! Hands out read-write connections to a single database, bounded by the
//! configured limits:
//! - at most `max_open_conns` connections exist at once; callers beyond that
//!   block until one is returned
//! - at most `max_idle_conns` unused connections are kept around
//! - connections older than `max_conn_lifetime_mins` are closed rather than
//!   reused
//!
//! The pool never retries a failed open. Dropping it (or calling
//! [`ConnectionPool::close`]) releases every connection.

use parking_lot::{Condvar, Mutex};
use rusqlite::{Connection, OpenFlags};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use strata_core::{observe, Result, SqlConfig, StoreError};

struct Slot {
    conn: Connection,
    opened_at: Instant,
}

struct PoolState {
    idle: Vec<Slot>,
    open: usize,
}

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently open, idle or checked out
    pub open: usize,
    /// Connections open but not checked out
    pub idle: usize,
}

/// A connection checked out of the pool
///
/// Returned to the pool (or closed) when dropped.
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    slot: Option<Slot>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self
            .slot
            .as_ref()
            .expect("pooled connection is present until drop")
            .conn
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self
            .slot
            .as_mut()
            .expect("pooled connection is present until drop")
            .conn
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool.release(slot);
        }
    }
}

/// Blocking pool of SQLite connections
pub struct ConnectionPool {
    config: SqlConfig,
    max_lifetime: Duration,
    state: Mutex<PoolState>,
    released: Condvar,
}

impl ConnectionPool {
    /// Open the pool and verify the database is reachable
    ///
    /// Fails with `Connection` if the database cannot be opened or does not
    /// answer the liveness query.
    pub fn open(config: SqlConfig) -> Result<Self> {
        config.validate()?;

        let pool = Self {
            max_lifetime: config.max_conn_lifetime(),
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(config.max_idle_conns),
                open: 0,
            }),
            released: Condvar::new(),
            config,
        };

        pool.ping()?;

        tracing::info!(
            dsn = %pool.config.dsn,
            max_open = pool.config.max_open_conns,
            max_idle = pool.config.max_idle_conns,
            max_lifetime_mins = pool.config.max_conn_lifetime_mins,
            "Opened connection pool"
        );

        Ok(pool)
    }

    /// Round-trip a trivial query through a pooled connection
    pub fn ping(&self) -> Result<()> {
        let conn = self.acquire()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::Connection(format!("liveness check failed: {}", e)))?;
        Ok(())
    }

    /// Check out a connection, blocking while the pool is exhausted
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let started = Instant::now();
        let mut state = self.state.lock();

        loop {
            while let Some(slot) = state.idle.pop() {
                if slot.opened_at.elapsed() < self.max_lifetime {
                    observe::record_pool_wait(started.elapsed());
                    return Ok(PooledConnection {
                        pool: self,
                        slot: Some(slot),
                    });
                }
                // Expired while idle
                state.open -= 1;
            }

            if state.open < self.config.max_open_conns {
                state.open += 1;
                drop(state);

                return match self.connect() {
                    Ok(conn) => {
                        observe::record_pool_wait(started.elapsed());
                        Ok(PooledConnection {
                            pool: self,
                            slot: Some(Slot {
                                conn,
                                opened_at: Instant::now(),
                            }),
                        })
                    }
                    Err(e) => {
                        self.state.lock().open -= 1;
                        self.released.notify_one();
                        Err(e)
                    }
                };
            }

            self.released.wait(&mut state);
        }
    }

    /// Current pool occupancy
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            open: state.open,
            idle: state.idle.len(),
        }
    }

    pub fn config(&self) -> &SqlConfig {
        &self.config
    }

    /// Close every idle connection
    ///
    /// Checked-out connections borrow the pool, so consuming it means none
    /// are outstanding and no further `acquire` is possible. The first close
    /// failure is returned as `Connection`.
    pub fn close(self) -> Result<()> {
        let idle = std::mem::take(&mut self.state.lock().idle);
        let count = idle.len();

        let mut failure = None;
        for slot in idle {
            if let Err((_, e)) = slot.conn.close() {
                failure.get_or_insert(e);
            }
        }

        tracing::info!(dsn = %self.config.dsn, closed = count, "Closed connection pool");

        match failure {
            Some(e) => Err(StoreError::Connection(format!(
                "unable to close connection: {}",
                e
            ))),
            None => Ok(()),
        }
    }

    fn release(&self, slot: Slot) {
        let mut state = self.state.lock();
        let reusable = state.idle.len() < self.config.max_idle_conns
            && slot.opened_at.elapsed() < self.max_lifetime;

        if reusable {
            state.idle.push(slot);
        } else {
            state.open -= 1;
        }
        observe::set_pool_size(state.open, state.idle.len());

        drop(state);
        self.released.notify_one();
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.config.dsn,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            StoreError::Connection(format!("unable to open '{}': {}", self.config.dsn, e))
        })?;

        Self::configure_connection(&conn, &self.config)?;
        Ok(conn)
    }

    /// Configure SQLite connection
    fn configure_connection(conn: &Connection, cfg: &SqlConfig) -> Result<()> {
        conn.busy_timeout(cfg.busy_timeout())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if cfg.wal_mode {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        }

        conn.pragma_update(None, "synchronous", cfg.synchronous.as_pragma())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(())
    }

    #[cfg(test)]
    fn with_max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }
}
