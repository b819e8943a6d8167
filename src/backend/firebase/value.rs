//! Firestore typed-value JSON
//!
//! Firestore's REST API wraps every field in a single-key object naming its
//! type: `{"stringValue": "hi"}`, `{"integerValue": "42"}` (64-bit integers
//! travel as strings), `{"arrayValue": {"values": [...]}}` and so on.

use crate::backend::{StoreError, StoreResult};
use crate::types::{FieldValue, Fields, Record, RecordId, Timestamp};
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        FieldValue::Int(n) => json!({ "integerValue": n.to_string() }),
        FieldValue::Float(f) => json!({ "doubleValue": f }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            let formatted = ts
                .to_datetime()
                .and_then(|dt| dt.format(&Rfc3339).ok())
                .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string());
            json!({ "timestampValue": formatted })
        }
        FieldValue::List(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
    }
}

pub fn encode_fields(fields: &Fields) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(map)
}

pub fn decode_value(value: &Value) -> StoreResult<FieldValue> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected typed value, got {value}")))?;
    let Some((kind, inner)) = object.iter().next() else {
        return Err(StoreError::Decode("empty typed value".to_string()));
    };

    let decoded = match kind.as_str() {
        "nullValue" => FieldValue::Null,
        "booleanValue" => FieldValue::Bool(
            inner
                .as_bool()
                .ok_or_else(|| StoreError::Decode(format!("bad booleanValue {inner}")))?,
        ),
        "integerValue" => {
            let parsed = match inner {
                Value::String(raw) => raw.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            FieldValue::Int(
                parsed.ok_or_else(|| StoreError::Decode(format!("bad integerValue {inner}")))?,
            )
        }
        "doubleValue" => FieldValue::Float(
            inner
                .as_f64()
                .ok_or_else(|| StoreError::Decode(format!("bad doubleValue {inner}")))?,
        ),
        "stringValue" => FieldValue::String(inner.as_str().unwrap_or_default().to_string()),
        "timestampValue" => {
            let raw = inner.as_str().unwrap_or_default();
            let datetime = OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|e| StoreError::Decode(format!("bad timestampValue '{raw}': {e}")))?;
            FieldValue::Timestamp(Timestamp::from_datetime(datetime))
        }
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<StoreResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            FieldValue::List(items)
        }
        other => {
            // maps, references, geo points and bytes are not used by the app
            tracing::debug!(kind = other, "ignoring unsupported firestore value");
            FieldValue::Null
        }
    };
    Ok(decoded)
}

pub fn decode_fields(value: Option<&Value>) -> StoreResult<Fields> {
    let Some(object) = value.and_then(Value::as_object) else {
        return Ok(Fields::new());
    };
    object
        .iter()
        .map(|(key, value)| decode_value(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}

/// Last path segment of a document resource name.
pub fn document_id(name: &str) -> Option<RecordId> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(RecordId::from)
}

/// Decodes a `Document` resource into a confirmed record.
pub fn decode_document(document: &Value, order_field: &str) -> StoreResult<Record> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Decode("document without name".to_string()))?;
    let id = document_id(name)
        .ok_or_else(|| StoreError::Decode(format!("bad document name '{name}'")))?;
    let fields = decode_fields(document.get("fields"))?;
    Ok(Record::from_document(id, fields, order_field))
}
