// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Response-shape normalization. The backend answers HTTP 200 even for
//! logical failures, so a negative or unrecognized envelope becomes an
//! empty result here instead of an error. The two cases are still told
//! apart in the logs.

use jdas_app::Record;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    BareList,
    RowsEnvelope,
    BlocksEnvelope,
    Failed,
    Unrecognized,
}

pub fn classify_envelope(value: &Value) -> EnvelopeShape {
    match value {
        Value::Array(_) => EnvelopeShape::BareList,
        Value::Object(object) => match object.get("ok").and_then(Value::as_bool) {
            Some(true) if object.get("value").is_some_and(Value::is_array) => {
                EnvelopeShape::RowsEnvelope
            }
            Some(true) if object.get("blocks").is_some_and(Value::is_object) => {
                EnvelopeShape::BlocksEnvelope
            }
            Some(false) => EnvelopeShape::Failed,
            _ => EnvelopeShape::Unrecognized,
        },
        _ => EnvelopeShape::Unrecognized,
    }
}

/// A bare list as-is, or the `value` list of a successful envelope.
pub fn normalize_list(value: Value) -> Vec<Value> {
    match classify_envelope(&value) {
        EnvelopeShape::BareList => match value {
            Value::Array(items) => items,
            _ => Vec::new(),
        },
        EnvelopeShape::RowsEnvelope => match value {
            Value::Object(mut object) => match object.remove("value") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        },
        shape => {
            log_swallowed(shape, &value, "rows");
            Vec::new()
        }
    }
}

pub fn normalize_rows(value: Value) -> Vec<Record> {
    normalize_list(value)
        .into_iter()
        .filter_map(Record::from_value)
        .collect()
}

/// The `blocks` mapping of a successful summary envelope.
pub fn normalize_blocks(value: Value) -> Map<String, Value> {
    match classify_envelope(&value) {
        EnvelopeShape::BlocksEnvelope => match value {
            Value::Object(mut object) => match object.remove("blocks") {
                Some(Value::Object(blocks)) => blocks,
                _ => Map::new(),
            },
            _ => Map::new(),
        },
        shape => {
            log_swallowed(shape, &value, "blocks");
            Map::new()
        }
    }
}

fn log_swallowed(shape: EnvelopeShape, value: &Value, expected: &str) {
    match shape {
        EnvelopeShape::Failed => {
            let reason = value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("no reason given");
            tracing::warn!(expected, reason, "backend reported failure; treating as no data");
        }
        _ => {
            tracing::warn!(expected, ?shape, "unrecognized response shape; treating as no data");
        }
    }
}
