pub mod sql;
pub mod wide_column;

pub use sql::{SqlConfig, SynchronousMode};
pub use wide_column::WideColumnConfig;
