pub mod namespace;
pub mod record;
pub mod value;

pub use namespace::Namespace;
pub use record::{Record, MAX_ID_LEN};
pub use value::{Payload, Value, MAX_DEPTH};
