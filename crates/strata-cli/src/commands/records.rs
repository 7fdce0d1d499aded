//! Single-operation commands

use anyhow::{bail, Context, Result};
use strata_core::{Namespace, RecordBackend, Value};

use super::record_json;

pub fn create_table(backend: &dyn RecordBackend) -> Result<()> {
    backend.create_table().context("Failed to create table")?;
    println!("Table created");
    Ok(())
}

pub fn drop_table(backend: &dyn RecordBackend) -> Result<()> {
    backend.drop_table().context("Failed to drop table")?;
    println!("Table dropped");
    Ok(())
}

pub fn list(backend: &dyn RecordBackend) -> Result<()> {
    let records = backend.read_all().context("Failed to read records")?;
    for record in &records {
        println!("{}", record_json(record));
    }
    tracing::info!(count = records.len(), "Listed records");
    Ok(())
}

pub fn get(backend: &dyn RecordBackend, id: &str) -> Result<()> {
    let record = backend
        .read_by_id(id)
        .with_context(|| format!("Failed to read record '{}'", id))?;
    println!("{}", record_json(&record));
    Ok(())
}

pub fn upsert(backend: &dyn RecordBackend, namespace: &str, id: &str, payload: &str) -> Result<()> {
    let ns: Namespace = namespace.parse()?;

    let json: serde_json::Value =
        serde_json::from_str(payload).context("Payload is not valid JSON")?;
    let payload = match Value::try_from(json)? {
        Value::Map(map) => map,
        other => bail!("Payload must be a JSON object, got {}", other.type_name()),
    };

    let outcome = backend
        .upsert_by_namespace(ns, id, payload)
        .with_context(|| format!("Failed to upsert {} of '{}'", ns, id))?;

    println!(
        "{} {}: {}",
        if outcome.applied { "Upserted" } else { "Unchanged" },
        ns,
        serde_json::Value::from(Value::Map(outcome.payload))
    );
    Ok(())
}
