use super::value::Payload;

/// Maximum length of a record id, in characters
pub const MAX_ID_LEN: usize = 36;

/// The unit of storage: an id plus two optional payload fields
///
/// Records are built by callers and handed to a backend; the backend never
/// constructs one except when decoding a stored row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Caller-supplied identifier, unique per table
    pub id: String,

    /// Item-like payload, stored in the `primaryPayload` column
    pub primary_payload: Option<Payload>,

    /// Stock-like payload, stored in the `secondaryPayload` column
    pub secondary_payload: Option<Payload>,
}

impl Record {
    /// Create a record with no payloads
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            primary_payload: None,
            secondary_payload: None,
        }
    }

    pub fn with_primary(mut self, payload: Payload) -> Self {
        self.primary_payload = Some(payload);
        self
    }

    pub fn with_secondary(mut self, payload: Payload) -> Self {
        self.secondary_payload = Some(payload);
        self
    }
}
