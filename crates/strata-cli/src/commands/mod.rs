pub mod demo;
pub mod records;

use strata_core::{Payload, Record, Value};

/// JSON view of a record for printing
pub fn record_json(record: &Record) -> serde_json::Value {
    let column = |payload: &Option<Payload>| {
        payload
            .clone()
            .map(|p| serde_json::Value::from(Value::Map(p)))
            .unwrap_or(serde_json::Value::Null)
    };

    serde_json::json!({
        "id": record.id,
        "primaryPayload": column(&record.primary_payload),
        "secondaryPayload": column(&record.secondary_payload),
    })
}
