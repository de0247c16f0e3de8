//! JSON envelope codec.
//!
//! Records are exchanged as `{"schema": …, "payload": …}` sections, the layout
//! used by Kafka Connect's JSON converter with schemas enabled:
//!
//! - schema: `{"type": "struct", "optional": false, "name": …, "version": …,
//!   "doc": …, "parameters": {…}, "default": …, "fields": [{"field": "id", …}]}`;
//!   arrays carry `"items"`, maps carry `"keys"` and `"values"`;
//! - payload: plain JSON, bytes as base64, maps with string keys as objects and
//!   any other map as an array of `[key, value]` pairs.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as Json};

use crate::error::PluginError;
use crate::record::Record;
use crate::schema::{Schema, SchemaBuilder, SchemaType};
use crate::value::{Struct, Value};

// ═══════════════════════════════════════════════════════════════
//  Schema ↔ JSON
// ═══════════════════════════════════════════════════════════════

pub fn schema_to_json(schema: &Schema) -> Json {
    let mut obj = JsonMap::new();
    obj.insert("type".into(), json!(schema.schema_type().as_str()));
    obj.insert("optional".into(), json!(schema.is_optional()));
    if let Some(name) = schema.name() {
        obj.insert("name".into(), json!(name));
    }
    if let Some(version) = schema.version() {
        obj.insert("version".into(), json!(version));
    }
    if let Some(doc) = schema.doc() {
        obj.insert("doc".into(), json!(doc));
    }
    if !schema.parameters().is_empty() {
        obj.insert("parameters".into(), json!(schema.parameters()));
    }
    if let Some(default) = schema.default_value() {
        obj.insert("default".into(), value_to_json(default, Some(schema)));
    }
    match schema.schema_type() {
        SchemaType::Struct => {
            let fields = schema
                .fields()
                .iter()
                .map(|f| {
                    let mut field_json = schema_to_json(f.schema());
                    if let Json::Object(map) = &mut field_json {
                        map.insert("field".into(), json!(f.name()));
                    }
                    field_json
                })
                .collect();
            obj.insert("fields".into(), Json::Array(fields));
        }
        SchemaType::Array => {
            if let Some(items) = schema.value_schema() {
                obj.insert("items".into(), schema_to_json(items));
            }
        }
        SchemaType::Map => {
            if let Some(keys) = schema.key_schema() {
                obj.insert("keys".into(), schema_to_json(keys));
            }
            if let Some(values) = schema.value_schema() {
                obj.insert("values".into(), schema_to_json(values));
            }
        }
        _ => {}
    }
    Json::Object(obj)
}

pub fn schema_from_json(json: &Json) -> Result<Arc<Schema>, PluginError> {
    let obj = json
        .as_object()
        .ok_or_else(|| PluginError::format("schema must be a JSON object"))?;

    let schema_type: SchemaType = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| PluginError::format("schema is missing string attribute 'type'"))?
        .parse()?;

    let mut builder = match schema_type {
        SchemaType::Array => {
            let items = obj
                .get("items")
                .ok_or_else(|| PluginError::format("array schema is missing 'items'"))?;
            SchemaBuilder::array(schema_from_json(items)?)
        }
        SchemaType::Map => {
            let keys = obj
                .get("keys")
                .ok_or_else(|| PluginError::format("map schema is missing 'keys'"))?;
            let values = obj
                .get("values")
                .ok_or_else(|| PluginError::format("map schema is missing 'values'"))?;
            SchemaBuilder::map(schema_from_json(keys)?, schema_from_json(values)?)
        }
        other => SchemaBuilder::new(other),
    };

    if obj.get("optional").and_then(Json::as_bool).unwrap_or(false) {
        builder = builder.optional();
    }
    if let Some(name) = obj.get("name").and_then(Json::as_str) {
        builder = builder.name(name);
    }
    if let Some(version) = obj.get("version").and_then(Json::as_i64) {
        let version = i32::try_from(version)
            .map_err(|_| PluginError::format(format!("schema version {version} out of range")))?;
        builder = builder.version(version);
    }
    if let Some(doc) = obj.get("doc").and_then(Json::as_str) {
        builder = builder.doc(doc);
    }
    if let Some(params) = obj.get("parameters") {
        let params: BTreeMap<String, String> = serde_json::from_value(params.clone())?;
        for (k, v) in params {
            builder = builder.parameter(k, v);
        }
    }
    if schema_type == SchemaType::Struct {
        let fields = obj
            .get("fields")
            .and_then(Json::as_array)
            .ok_or_else(|| PluginError::format("struct schema is missing array 'fields'"))?;
        for field in fields {
            let name = field
                .get("field")
                .and_then(Json::as_str)
                .ok_or_else(|| PluginError::format("struct field is missing 'field' name"))?;
            let field_schema =
                schema_from_json(field).map_err(|e| e.with_context(format!("field '{name}'")))?;
            builder = builder.field(name, field_schema);
        }
    }

    // Default is decoded against the schema being built, so build twice.
    match obj.get("default") {
        Some(default) if !default.is_null() => {
            let shape = builder.clone().build()?;
            let value = value_from_json(default, &shape)?;
            builder.default_value(value).build()
        }
        _ => builder.build(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Value ↔ JSON
// ═══════════════════════════════════════════════════════════════

/// Encode a value. `schema` only steers map layout; structs carry their own.
pub fn value_to_json(value: &Value, schema: Option<&Schema>) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => json!(b),
        Value::Int8(i) => json!(i),
        Value::Int16(i) => json!(i),
        Value::Int32(i) => json!(i),
        Value::Int64(i) => json!(i),
        Value::Float32(f) => json!(f),
        Value::Float64(f) => json!(f),
        Value::String(s) => json!(s),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::Array(items) => {
            let element = schema.and_then(|s| s.value_schema()).map(Arc::as_ref);
            Json::Array(items.iter().map(|v| value_to_json(v, element)).collect())
        }
        Value::Map(entries) => {
            let key_schema = schema.and_then(|s| s.key_schema()).map(Arc::as_ref);
            let val_schema = schema.and_then(|s| s.value_schema()).map(Arc::as_ref);
            let string_keys = match key_schema {
                Some(k) => k.schema_type() == SchemaType::String,
                None => entries.iter().all(|(k, _)| matches!(k, Value::String(_))),
            };
            if string_keys {
                let obj = entries
                    .iter()
                    .filter_map(|(k, v)| match k {
                        Value::String(k) => Some((k.clone(), value_to_json(v, val_schema))),
                        _ => None,
                    })
                    .collect();
                Json::Object(obj)
            } else {
                Json::Array(
                    entries
                        .iter()
                        .map(|(k, v)| {
                            json!([value_to_json(k, key_schema), value_to_json(v, val_schema)])
                        })
                        .collect(),
                )
            }
        }
        Value::Struct(s) => {
            let obj = s
                .iter()
                .map(|(field, v)| (field.name().to_string(), value_to_json(v, Some(field.schema()))))
                .collect();
            Json::Object(obj)
        }
    }
}

/// Decode a payload against its schema.
///
/// Struct fields missing from the payload are left unset; the struct is then
/// validated so required fields without defaults must be present.
pub fn value_from_json(json: &Json, schema: &Arc<Schema>) -> Result<Value, PluginError> {
    if json.is_null() {
        schema.validate_value(&Value::Null)?;
        return Ok(Value::Null);
    }

    let mismatch = || {
        PluginError::format(format!(
            "expected {} payload, got {json}",
            schema.schema_type()
        ))
    };

    let value = match schema.schema_type() {
        SchemaType::Boolean => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
        SchemaType::Int8 => Value::Int8(int_in_range(json).ok_or_else(mismatch)?),
        SchemaType::Int16 => Value::Int16(int_in_range(json).ok_or_else(mismatch)?),
        SchemaType::Int32 => Value::Int32(int_in_range(json).ok_or_else(mismatch)?),
        SchemaType::Int64 => Value::Int64(json.as_i64().ok_or_else(mismatch)?),
        SchemaType::Float32 => Value::Float32(float32_in_range(json).ok_or_else(mismatch)?),
        SchemaType::Float64 => Value::Float64(json.as_f64().ok_or_else(mismatch)?),
        SchemaType::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        SchemaType::Bytes => Value::Bytes(STANDARD.decode(json.as_str().ok_or_else(mismatch)?)?),
        SchemaType::Array => {
            let element = schema.value_schema().ok_or_else(mismatch)?;
            let items = json.as_array().ok_or_else(mismatch)?;
            Value::Array(
                items
                    .iter()
                    .map(|item| value_from_json(item, element))
                    .collect::<Result<_, _>>()?,
            )
        }
        SchemaType::Map => {
            let (key_schema, val_schema) = schema
                .key_schema()
                .zip(schema.value_schema())
                .ok_or_else(mismatch)?;
            let entries = match json {
                Json::Object(obj) => obj
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            value_from_json(&Json::String(k.clone()), key_schema)?,
                            value_from_json(v, val_schema)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, PluginError>>()?,
                Json::Array(pairs) => pairs
                    .iter()
                    .map(|pair| match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => Ok((
                            value_from_json(k, key_schema)?,
                            value_from_json(v, val_schema)?,
                        )),
                        _ => Err(PluginError::format(format!(
                            "map entry must be a [key, value] pair, got {pair}"
                        ))),
                    })
                    .collect::<Result<Vec<_>, PluginError>>()?,
                _ => return Err(mismatch()),
            };
            Value::Map(entries)
        }
        SchemaType::Struct => {
            let obj = json.as_object().ok_or_else(mismatch)?;
            let mut s = Struct::new(schema.clone())?;
            for field in schema.fields() {
                if let Some(v) = obj.get(field.name()) {
                    let decoded = value_from_json(v, field.schema())
                        .map_err(|e| e.with_context(format!("field '{}'", field.name())))?;
                    s.put(field.name(), decoded)?;
                }
            }
            s.validate().map_err(|e| PluginError::format(e.message))?;
            Value::Struct(s)
        }
    };
    Ok(value)
}

/// Decode a payload that came without a schema.
///
/// Integers become `Int64`, other numbers `Float64`, objects string-keyed maps.
pub fn value_from_schemaless_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(value_from_schemaless_json).collect()),
        Json::Object(obj) => Value::Map(
            obj.iter()
                .map(|(k, v)| (Value::String(k.clone()), value_from_schemaless_json(v)))
                .collect(),
        ),
    }
}

fn int_in_range<T: TryFrom<i64>>(json: &Json) -> Option<T> {
    json.as_i64().and_then(|i| T::try_from(i).ok())
}

/// A finite number that overflows `f32` is out of range, not infinity.
fn float32_in_range(json: &Json) -> Option<f32> {
    let f = json.as_f64()?;
    let narrowed = f as f32;
    (narrowed.is_finite() || !f.is_finite()).then_some(narrowed)
}

// ═══════════════════════════════════════════════════════════════
//  Record envelope
// ═══════════════════════════════════════════════════════════════

/// One `{"schema", "payload"}` section of an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaAndPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Json>,
    #[serde(default)]
    pub payload: Json,
}

impl SchemaAndPayload {
    fn decode(&self) -> Result<(Option<Arc<Schema>>, Value), PluginError> {
        match &self.schema {
            Some(schema_json) => {
                let schema = schema_from_json(schema_json)?;
                let value = value_from_json(&self.payload, &schema)?;
                Ok((Some(schema), value))
            }
            None => Ok((None, value_from_schemaless_json(&self.payload))),
        }
    }

    fn encode(schema: Option<&Arc<Schema>>, value: &Value) -> Self {
        Self {
            schema: schema.map(|s| schema_to_json(s)),
            payload: value_to_json(value, schema.map(Arc::as_ref)),
        }
    }
}

/// Serializable form of a [`Record`], one per JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<SchemaAndPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SchemaAndPayload>,
}

impl RecordEnvelope {
    pub fn into_record(self) -> Result<Record, PluginError> {
        let (key_schema, key) = match &self.key {
            Some(section) => section.decode().map_err(|e| e.with_context("key"))?,
            None => (None, Value::Null),
        };
        let (value_schema, value) = match &self.value {
            Some(section) => section.decode().map_err(|e| e.with_context("value"))?,
            None => (None, Value::Null),
        };
        Ok(Record {
            topic: self.topic,
            partition: self.partition,
            key_schema,
            key,
            value_schema,
            value,
            timestamp: self.timestamp,
        })
    }

    pub fn from_record(record: &Record) -> Self {
        let section = |schema: Option<&Arc<Schema>>, value: &Value| {
            if schema.is_none() && value.is_null() {
                None
            } else {
                Some(SchemaAndPayload::encode(schema, value))
            }
        };
        Self {
            topic: record.topic.clone(),
            partition: record.partition,
            timestamp: record.timestamp,
            key: section(record.key_schema.as_ref(), &record.key),
            value: section(record.value_schema.as_ref(), &record.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_envelope() -> Json {
        json!({
            "topic": "customers",
            "partition": 2,
            "timestamp": 1700000000000i64,
            "value": {
                "schema": {
                    "type": "struct",
                    "name": "Customer",
                    "version": 2,
                    "fields": [
                        {"field": "id", "type": "int32"},
                        {"field": "street", "type": "string", "optional": true, "doc": "line 1"},
                        {"field": "tags", "type": "map",
                         "keys": {"type": "string"}, "values": {"type": "int64"}},
                        {"field": "blob", "type": "bytes", "optional": true}
                    ]
                },
                "payload": {"id": 7, "street": "Main St", "tags": {"a": 1}, "blob": "AQI="}
            }
        })
    }

    #[test]
    fn envelope_decodes_schema_and_payload() {
        let env: RecordEnvelope = serde_json::from_value(address_envelope()).unwrap();
        let record = env.into_record().unwrap();

        assert_eq!(record.topic, "customers");
        assert_eq!(record.partition, Some(2));
        let schema = record.value_schema.as_ref().unwrap();
        assert_eq!(schema.name(), Some("Customer"));
        assert_eq!(schema.version(), Some(2));
        assert_eq!(schema.field("street").unwrap().schema().doc(), Some("line 1"));

        let value = record.value.as_struct().unwrap();
        assert_eq!(value.get("id"), Some(&Value::Int32(7)));
        assert_eq!(value.get("blob"), Some(&Value::Bytes(vec![1, 2])));
        assert_eq!(
            value.get("tags"),
            Some(&Value::Map(vec![(Value::from("a"), Value::Int64(1))]))
        );
    }

    #[test]
    fn envelope_encodes_back_to_same_json() {
        let env: RecordEnvelope = serde_json::from_value(address_envelope()).unwrap();
        let record = env.into_record().unwrap();
        let again = RecordEnvelope::from_record(&record);
        let payload = &again.value.as_ref().unwrap().payload;
        assert_eq!(
            payload,
            &json!({"id": 7, "street": "Main St", "tags": {"a": 1}, "blob": "AQI="})
        );
        assert!(again.key.is_none());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let schema = schema_from_json(&json!({
            "type": "struct",
            "fields": [{"field": "id", "type": "int32"}]
        }))
        .unwrap();
        let err = value_from_json(&json!({}), &schema).unwrap_err();
        assert!(err.message.contains("field 'id'"));
    }

    #[test]
    fn default_decoded_against_schema() {
        let schema = schema_from_json(&json!({"type": "int16", "default": 12})).unwrap();
        assert_eq!(schema.default_value(), Some(&Value::Int16(12)));
        assert!(schema_from_json(&json!({"type": "int8", "default": 1000})).is_err());
    }

    #[test]
    fn float32_payload_must_fit() {
        let schema = schema_from_json(&json!({"type": "float32"})).unwrap();
        assert_eq!(value_from_json(&json!(1.5), &schema).unwrap(), Value::Float32(1.5));

        let err = value_from_json(&json!(1e300), &schema).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Format);
        assert!(err.message.contains("expected float32 payload"));

        let float64 = schema_from_json(&json!({"type": "float64"})).unwrap();
        assert_eq!(value_from_json(&json!(1e300), &float64).unwrap(), Value::Float64(1e300));
    }

    #[test]
    fn struct_schema_without_fields_rejected() {
        let err = schema_from_json(&json!({"type": "struct", "fields": []})).unwrap_err();
        assert!(err.message.contains("at least one field"));
    }

    #[test]
    fn non_string_keyed_map_uses_pairs() {
        let schema = schema_from_json(&json!({
            "type": "map", "keys": {"type": "int32"}, "values": {"type": "string"}
        }))
        .unwrap();
        let value = value_from_json(&json!([[1, "one"]]), &schema).unwrap();
        assert_eq!(value, Value::Map(vec![(Value::Int32(1), Value::from("one"))]));
        assert_eq!(value_to_json(&value, Some(&schema)), json!([[1, "one"]]));
    }

    #[test]
    fn schemaless_payload_is_kept() {
        let env: RecordEnvelope = serde_json::from_value(json!({
            "topic": "raw",
            "value": {"payload": "plain text"}
        }))
        .unwrap();
        let record = env.into_record().unwrap();
        assert!(record.value_schema.is_none());
        assert_eq!(record.value, Value::from("plain text"));
    }
}
