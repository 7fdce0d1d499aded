pub mod backend;

pub use backend::{RecordBackend, Upserted};
