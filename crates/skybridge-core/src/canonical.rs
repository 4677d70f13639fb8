//! Canonical CBOR encoding for request records.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! The canonical encoding is what makes the protocol's idempotence and
//! completion matching work: the same request produces identical bytes (and
//! thus an identical content hash) on both sides of the relation, across
//! platforms and implementations.

use ciborium::value::Value;

use crate::capability::Capability;
use crate::error::CoreError;
use crate::request::RequestRecord;

/// Record field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const VERSION: u64 = 0;
    pub const WANT_CREDENTIALS: u64 = 1;
    pub const CAPABILITIES: u64 = 2;
    pub const LABEL: u64 = 3;
}

/// Current record encoding version.
pub const RECORD_VERSION: u8 = 0;

/// Encode a request record to canonical CBOR bytes.
pub fn canonical_request_bytes(record: &RequestRecord) -> Vec<u8> {
    let value = record_to_cbor_value(record);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

/// Convert a record to a CBOR Value (map with integer keys).
fn record_to_cbor_value(record: &RequestRecord) -> Value {
    // Build map entries in key order (already sorted 0-3)
    let mut entries = Vec::with_capacity(4);

    // 0: version
    entries.push((
        Value::Integer(keys::VERSION.into()),
        Value::Integer(RECORD_VERSION.into()),
    ));

    // 1: want_credentials
    entries.push((
        Value::Integer(keys::WANT_CREDENTIALS.into()),
        Value::Bool(record.want_credentials),
    ));

    // 2: capabilities (sorted array of wire names; BTreeSet iterates sorted)
    let caps: Vec<Value> = record
        .capabilities
        .iter()
        .map(|c| Value::Text(c.wire_name().to_string()))
        .collect();
    entries.push((Value::Integer(keys::CAPABILITIES.into()), Value::Array(caps)));

    // 3: label (null or text)
    let label_value = match &record.label {
        Some(label) => Value::Text(label.clone()),
        None => Value::Null,
    };
    entries.push((Value::Integer(keys::LABEL.into()), label_value));

    Value::Map(entries)
}

/// Recursively encode a CBOR value canonically.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                encode_uint(buf, 0, n as u64);
            } else {
                // CBOR encodes -1 as 0, -2 as 1, etc.
                encode_uint(buf, 1, (-1 - n) as u64);
            }
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        _ => {
            panic!("unsupported CBOR value type in canonical encoding");
        }
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

/// Decode a request record from canonical bytes.
///
/// Used by provider-side implementations (and the simulated provider in the
/// testkit) to recover the exact record a completion marker was computed
/// over.
pub fn decode_request(bytes: &[u8]) -> Result<RequestRecord, CoreError> {
    let cursor = std::io::Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(cursor).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::DecodingError("expected map".into())),
    };

    let get = |key: u64| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if i128::from(*i) == key as i128))
            .map(|(_, v)| v)
    };

    let version = match get(keys::VERSION) {
        Some(Value::Integer(i)) => i128::from(*i) as u8,
        _ => return Err(CoreError::DecodingError("missing version".into())),
    };
    if version != RECORD_VERSION {
        return Err(CoreError::DecodingError(format!(
            "unsupported record version: {version}"
        )));
    }

    let want_credentials = match get(keys::WANT_CREDENTIALS) {
        Some(Value::Bool(b)) => *b,
        _ => return Err(CoreError::DecodingError("missing want_credentials".into())),
    };

    let capabilities = match get(keys::CAPABILITIES) {
        Some(Value::Array(arr)) => {
            let mut caps = std::collections::BTreeSet::new();
            for item in arr {
                match item {
                    Value::Text(name) => {
                        caps.insert(name.parse::<Capability>()?);
                    }
                    _ => return Err(CoreError::DecodingError("invalid capability entry".into())),
                }
            }
            caps
        }
        _ => return Err(CoreError::DecodingError("missing capabilities".into())),
    };

    let label = match get(keys::LABEL) {
        Some(Value::Text(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        _ => return Err(CoreError::DecodingError("invalid label".into())),
    };

    Ok(RequestRecord {
        want_credentials,
        capabilities,
        label,
    })
}
