//! Binary payload codec
//!
//! Payloads are stored as a single version byte followed by one MessagePack
//! map. The version byte lets a reader reject blobs written by an
//! incompatible encoder instead of misinterpreting them.
//!
//! Nesting is capped at [`MAX_DEPTH`] on both sides, so a hostile blob cannot
//! exhaust the stack while decoding.
//!
//! # Example
//!
//! ```
//! use strata_core::{codec, Payload, Value};
//!
//! # fn main() -> strata_core::Result<()> {
//! let mut stock = Payload::new();
//! stock.insert("location".into(), Value::from("loc1"));
//! stock.insert("qty".into(), Value::from(100));
//!
//! let bytes = codec::encode(&stock)?;
//! assert_eq!(codec::decode(&bytes)?, stock);
//! # Ok(())
//! # }
//! ```

use crate::types::{Payload, Value, MAX_DEPTH};
use crate::{Result, StoreError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Cursor;

/// Format version written as the first byte of every encoded payload
pub const CODEC_VERSION: u8 = 1;

/// Encode a payload to its binary form
pub fn encode(payload: &Payload) -> Result<Vec<u8>> {
    // The payload map itself is the first level
    let depth = 1 + payload.values().map(Value::depth).max().unwrap_or(0);
    if depth > MAX_DEPTH {
        return Err(StoreError::Encode(format!(
            "payload nesting depth {} exceeds the maximum of {}",
            depth, MAX_DEPTH
        )));
    }

    let mut buf = vec![CODEC_VERSION];
    rmp_serde::encode::write(&mut buf, payload).map_err(|e| StoreError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decode a payload produced by [`encode`]
pub fn decode(bytes: &[u8]) -> Result<Payload> {
    let (&version, body) = bytes
        .split_first()
        .ok_or_else(|| StoreError::Decode("empty buffer".into()))?;

    if version != CODEC_VERSION {
        return Err(StoreError::Decode(format!(
            "unsupported codec version {} (expected {})",
            version, CODEC_VERSION
        )));
    }

    let mut cursor = Cursor::new(body);
    let value = Value::deserialize(&mut rmp_serde::Deserializer::new(&mut cursor))
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let payload = match value {
        Value::Map(map) => map,
        other => {
            return Err(StoreError::Decode(format!(
                "payload must be a map, got {}",
                other.type_name()
            )))
        }
    };

    let consumed = cursor.position() as usize;
    if consumed != body.len() {
        return Err(StoreError::Decode(format!(
            "{} trailing bytes after payload",
            body.len() - consumed
        )));
    }

    Ok(payload)
}

/// Convert any serializable map-shaped value into a payload
///
/// Fails with `Encode` if the value does not serialize to a string-keyed map
/// or contains something the payload universe cannot hold.
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Payload> {
    let json = serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))?;
    match Value::try_from(json)? {
        Value::Map(map) => Ok(map),
        other => Err(StoreError::Encode(format!(
            "payload must be a map, got {}",
            other.type_name()
        ))),
    }
}

/// Convert a payload back into a caller-defined type
pub fn from_payload<T: DeserializeOwned>(payload: Payload) -> Result<T> {
    let json = serde_json::Value::from(Value::Map(payload));
    serde_json::from_value(json).map_err(|e| StoreError::Decode(e.to_string()))
}
