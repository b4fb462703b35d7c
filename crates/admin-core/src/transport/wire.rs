//! Canonical response decoding. Each collaborator response has exactly one
//! accepted layout; anything else is an `AdminError::Decode`. Extra keys next
//! to the required ones are ignored.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AdminError, Result};
use crate::metrics::MetricValue;
use crate::types::{BulkActionResponse, FieldUpdateResponse, ListPage};

fn decode<T: DeserializeOwned>(what: &'static str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| AdminError::decode(what, e.to_string()))
}

pub fn list_page(body: Value) -> Result<ListPage> {
    decode("list", body)
}

pub fn bulk_response(body: Value) -> Result<BulkActionResponse> {
    decode("bulk action", body)
}

pub fn field_update(body: Value) -> Result<FieldUpdateResponse> {
    decode("field update", body)
}

/// A metric body is a bare number or a flat object of numbers.
pub fn metric_value(body: Value) -> Result<MetricValue> {
    match body {
        Value::Number(n) => n
            .as_f64()
            .map(MetricValue::Scalar)
            .ok_or_else(|| AdminError::decode("metric", "number out of range")),
        Value::Object(map) => {
            let mut parts = BTreeMap::new();
            for (key, value) in map {
                let n = value.as_f64().ok_or_else(|| {
                    AdminError::decode("metric", format!("\"{key}\" is not a number"))
                })?;
                parts.insert(key, n);
            }
            Ok(MetricValue::Breakdown(parts))
        }
        other => Err(AdminError::decode(
            "metric",
            format!("expected number or object, got {other}"),
        )),
    }
}
