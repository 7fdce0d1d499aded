//! Demo command: a create -> insert -> read -> drop smoke sequence
//!
//! Failures at each step are logged and the sequence carries on, so a
//! single run shows how every operation behaves against the backend.

use anyhow::Result;
use strata_core::{Payload, Record, RecordBackend, Value};

use super::record_json;

fn sample_record(id: String) -> Record {
    let mut item = Payload::new();
    item.insert("item".into(), Value::from("item1"));
    item.insert("qty".into(), Value::from(10));

    let mut stock = Payload::new();
    stock.insert("location".into(), Value::from("loc1"));
    stock.insert("qty".into(), Value::from(100));

    Record::new(id).with_primary(item).with_secondary(stock)
}

pub fn sample_records(count: usize) -> Vec<Record> {
    (0..count).map(|i| sample_record(format!("id{}", i))).collect()
}

pub fn execute(backend: &dyn RecordBackend, count: usize, keep: bool) -> Result<()> {
    tracing::info!(backend = backend.name(), count, "Running demo");

    match backend.create_table() {
        Ok(()) => tracing::info!("Table created successfully"),
        Err(e) => tracing::error!(error = %e, "Unable to create table"),
    }

    let mut inserted = 0;
    for record in sample_records(count) {
        match backend.insert(&record) {
            Ok(()) => inserted += 1,
            Err(e) => tracing::error!(id = %record.id, error = %e, "Unable to insert record"),
        }
    }
    tracing::info!(inserted, "Inserted sample records");

    match backend.read_all() {
        Ok(records) => {
            tracing::info!(count = records.len(), "Records read successfully");
            for record in &records {
                println!("{}", record_json(record));
            }
        }
        Err(e) => tracing::error!(error = %e, "Unable to read records"),
    }

    if keep {
        tracing::info!("Keeping table");
        return Ok(());
    }

    match backend.drop_table() {
        Ok(()) => tracing::info!("Table dropped successfully"),
        Err(e) => tracing::error!(error = %e, "Unable to drop table"),
    }

    Ok(())
}
