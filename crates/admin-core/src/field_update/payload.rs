//! Partial-payload construction for single-field saves.

use serde_json::{Map, Value};

use crate::types::Record;

/// Build the body for saving `field = value` on record `id`.
///
/// Identity and the changed field are always present. When any of the
/// `preserved` siblings currently holds a value on the cached record, all of
/// them are sent (missing ones as `""`) so a backend that clears absent
/// fields does not wipe them.
pub fn build_payload(
    id: &str,
    field: &str,
    value: &Value,
    current: Option<&Record>,
    preserved: &[String],
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("id".to_string(), Value::String(id.to_string()));

    if let Some(record) = current {
        let any_present = preserved
            .iter()
            .any(|name| name != field && record.has_value(name));
        if any_present {
            for name in preserved.iter().filter(|name| *name != field) {
                let v = record
                    .get(name)
                    .filter(|v| !v.is_null())
                    .unwrap_or_else(|| Value::String(String::new()));
                payload.insert(name.clone(), v);
            }
        }
    }

    payload.insert(field.to_string(), value.clone());
    payload
}
