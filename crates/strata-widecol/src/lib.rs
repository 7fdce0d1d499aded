//! Wide-column backend for strata
//!
//! Implements [`RecordBackend`](strata_core::RecordBackend) so callers can
//! be written against either engine, but no operation is built out yet:
//! each one returns `StoreError::NotImplemented`.

pub mod store;

pub use store::WideColumnStore;
