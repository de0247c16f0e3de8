use std::sync::Arc;

use crate::error::PluginError;
use crate::schema::{Field, Schema, SchemaType};

/// Canonical in-memory value.
///
/// `Null` doubles as "absent": a record without a value carries `Value::Null`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),

    Array(Vec<Value>),
    /// Entries in insertion order. Keys are arbitrary values, not only strings.
    Map(Vec<(Value, Value)>),
    Struct(Struct),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Short type label for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Struct> for Value {
    fn from(v: Struct) -> Self {
        Value::Struct(v)
    }
}

/// Field values bound to exactly one STRUCT schema.
///
/// Values are stored by field position; unset fields hold `Value::Null`.
/// Built incrementally with [`Struct::put`], then handed off and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Struct {
    pub fn new(schema: Arc<Schema>) -> Result<Self, PluginError> {
        if schema.schema_type() != SchemaType::Struct {
            return Err(PluginError::data(format!(
                "cannot bind a struct to a {} schema",
                schema.schema_type()
            )));
        }
        let values = vec![Value::Null; schema.fields().len()];
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Set a field by name, validating the value against the field schema.
    pub fn put(&mut self, name: &str, value: Value) -> Result<&mut Self, PluginError> {
        let field = self.lookup(name)?;
        let index = field.index();
        field
            .schema()
            .validate_value(&value)
            .map_err(|e| e.with_context(format!("field '{name}'")))?;
        self.values[index] = value;
        Ok(self)
    }

    /// Owned-builder form of [`Struct::put`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, PluginError> {
        self.put(name, value.into())?;
        Ok(self)
    }

    /// Field value, falling back to the field schema's default when unset.
    ///
    /// `None` if the schema declares no such field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let field = self.schema.field(name)?;
        let value = &self.values[field.index()];
        match (value, field.schema().default_value()) {
            (Value::Null, Some(default)) => Some(default),
            _ => Some(value),
        }
    }

    /// Field value exactly as stored, without default fallback.
    pub fn get_without_default(&self, name: &str) -> Option<&Value> {
        let field = self.schema.field(name)?;
        Some(&self.values[field.index()])
    }

    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.get(name).and_then(Value::as_struct)
    }

    /// `(field, stored value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.schema.fields().iter().zip(self.values.iter())
    }

    /// Check that every required field (non-optional, no default) is set,
    /// recursing into nested structs.
    pub fn validate(&self) -> Result<(), PluginError> {
        for (field, value) in self.iter() {
            field
                .schema()
                .validate_value(value)
                .map_err(|e| e.with_context(format!("field '{}'", field.name())))?;
            if let Value::Struct(nested) = value {
                nested
                    .validate()
                    .map_err(|e| e.with_context(format!("field '{}'", field.name())))?;
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&Field, PluginError> {
        self.schema.field(name).ok_or_else(|| {
            PluginError::data(format!(
                "'{name}' is not a field of struct{}",
                self.schema.name().map(|n| format!(" '{n}'")).unwrap_or_default()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;

    fn person_schema() -> Arc<Schema> {
        SchemaBuilder::struct_()
            .name("Person")
            .field("id", SchemaBuilder::new(SchemaType::Int32).build().unwrap())
            .field(
                "nick",
                SchemaBuilder::new(SchemaType::String).optional().build().unwrap(),
            )
            .field(
                "country",
                SchemaBuilder::new(SchemaType::String)
                    .default_value(Value::from("NL"))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn put_validates_name_and_type() {
        let mut s = Struct::new(person_schema()).unwrap();
        assert!(s.put("id", Value::Int32(1)).is_ok());

        let err = s.put("age", Value::Int32(3)).unwrap_err();
        assert!(err.message.contains("'age' is not a field of struct 'Person'"));

        let err = s.put("id", Value::from("one")).unwrap_err();
        assert!(err.message.starts_with("field 'id'"));

        assert!(s.put("id", Value::Null).is_err());
        assert!(s.put("nick", Value::Null).is_ok());
    }

    #[test]
    fn get_falls_back_to_default() {
        let s = Struct::new(person_schema()).unwrap().with("id", 7).unwrap();
        assert_eq!(s.get("country"), Some(&Value::from("NL")));
        assert_eq!(s.get_without_default("country"), Some(&Value::Null));
        assert_eq!(s.get("id"), Some(&Value::Int32(7)));
        assert_eq!(s.get("missing"), None);
    }

    #[test]
    fn validate_reports_missing_required_field() {
        let s = Struct::new(person_schema()).unwrap();
        let err = s.validate().unwrap_err();
        assert!(err.message.starts_with("field 'id'"));

        let complete = s.with("id", 1).unwrap();
        assert!(complete.validate().is_ok());
    }

    #[test]
    fn nested_struct_must_match_field_schema() {
        let inner = SchemaBuilder::struct_()
            .name("Inner")
            .field("a", SchemaBuilder::new(SchemaType::Int32).build().unwrap())
            .build()
            .unwrap();
        let other = inner.to_builder().name("Other").build().unwrap();
        let outer = SchemaBuilder::struct_().field("inner", inner.clone()).build().unwrap();

        let good = Struct::new(inner).unwrap().with("a", 1).unwrap();
        let bad = Struct::new(other).unwrap().with("a", 1).unwrap();

        let mut s = Struct::new(outer).unwrap();
        assert!(s.put("inner", good.into()).is_ok());
        assert!(s.put("inner", bad.into()).is_err());
    }

    #[test]
    fn struct_requires_struct_schema() {
        let schema = SchemaBuilder::new(SchemaType::Int64).build().unwrap();
        assert!(Struct::new(schema).is_err());
    }
}
