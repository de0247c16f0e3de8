use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::PluginError;
use crate::value::Value;

/// Type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    String,
    Bytes,
    Array,
    Map,
    Struct,
}

impl SchemaType {
    pub fn is_primitive(self) -> bool {
        !matches!(self, Self::Array | Self::Map | Self::Struct)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Array => "array",
            Self::Map => "map",
            Self::Struct => "struct",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaType {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "boolean" => Self::Boolean,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            "array" => Self::Array,
            "map" => Self::Map,
            "struct" => Self::Struct,
            other => return Err(PluginError::schema(format!("unknown schema type '{other}'"))),
        })
    }
}

/// A single named field of a STRUCT schema.
///
/// `index` is the field's position in the owning schema's field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    index: usize,
    schema: Arc<Schema>,
}

impl Field {
    pub fn new(name: impl Into<String>, index: usize, schema: Arc<Schema>) -> Self {
        Self {
            name: name.into(),
            index,
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

/// Immutable type description.
///
/// Children (`fields`, `key_schema`, `value_schema`) are held behind `Arc`, so a
/// rewritten tree shares every subtree it did not touch with the original.
/// Instances are only created through [`SchemaBuilder`], which enforces the
/// structural invariants:
///
/// - `fields` only on STRUCT and never empty there, names unique, `index` equal
///   to position;
/// - `key_schema` only on MAP, `value_schema` only on ARRAY and MAP (both required there);
/// - `default_value`, when present, conforms to the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    schema_type: SchemaType,
    optional: bool,
    default_value: Option<Value>,
    name: Option<String>,
    version: Option<i32>,
    doc: Option<String>,
    parameters: BTreeMap<String, String>,
    fields: Vec<Field>,
    key_schema: Option<Arc<Schema>>,
    value_schema: Option<Arc<Schema>>,
}

impl Schema {
    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Ordered field list. Empty for every type except STRUCT.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name (linear scan; schemas are small).
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn key_schema(&self) -> Option<&Arc<Schema>> {
        self.key_schema.as_ref()
    }

    pub fn value_schema(&self) -> Option<&Arc<Schema>> {
        self.value_schema.as_ref()
    }

    /// A builder pre-populated with every attribute of this schema.
    ///
    /// Children are shared, not copied.
    pub fn to_builder(&self) -> SchemaBuilder {
        SchemaBuilder {
            schema_type: self.schema_type,
            optional: self.optional,
            default_value: self.default_value.clone(),
            name: self.name.clone(),
            version: self.version,
            doc: self.doc.clone(),
            parameters: self.parameters.clone(),
            fields: self.fields.clone(),
            key_schema: self.key_schema.clone(),
            value_schema: self.value_schema.clone(),
        }
    }

    /// Check that `value` conforms to this schema.
    ///
    /// Null is accepted for optional schemas and for schemas carrying a default.
    /// Struct values must be bound to a schema equal to this one.
    pub fn validate_value(&self, value: &Value) -> Result<(), PluginError> {
        let ok = match (self.schema_type, value) {
            (_, Value::Null) => {
                if self.optional || self.default_value.is_some() {
                    return Ok(());
                }
                return Err(PluginError::data(format!(
                    "null used for required {} schema{}",
                    self.schema_type,
                    self.describe_name()
                )));
            }
            (SchemaType::Int8, Value::Int8(_))
            | (SchemaType::Int16, Value::Int16(_))
            | (SchemaType::Int32, Value::Int32(_))
            | (SchemaType::Int64, Value::Int64(_))
            | (SchemaType::Float32, Value::Float32(_))
            | (SchemaType::Float64, Value::Float64(_))
            | (SchemaType::Boolean, Value::Bool(_))
            | (SchemaType::String, Value::String(_))
            | (SchemaType::Bytes, Value::Bytes(_)) => true,
            (SchemaType::Array, Value::Array(items)) => {
                if let Some(element) = &self.value_schema {
                    for item in items {
                        element.validate_value(item)?;
                    }
                }
                true
            }
            (SchemaType::Map, Value::Map(entries)) => {
                if let (Some(key), Some(val)) = (&self.key_schema, &self.value_schema) {
                    for (k, v) in entries {
                        key.validate_value(k)?;
                        val.validate_value(v)?;
                    }
                }
                true
            }
            (SchemaType::Struct, Value::Struct(s)) => {
                let bound = s.schema();
                if !(std::ptr::eq(bound.as_ref(), self) || bound.as_ref() == self) {
                    return Err(PluginError::data(format!(
                        "struct bound to schema{} does not match schema{}",
                        bound.describe_name(),
                        self.describe_name()
                    )));
                }
                true
            }
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(PluginError::data(format!(
                "{} value does not conform to {} schema{}",
                value.type_name(),
                self.schema_type,
                self.describe_name()
            )))
        }
    }

    fn describe_name(&self) -> String {
        match &self.name {
            Some(n) => format!(" '{n}'"),
            None => String::new(),
        }
    }
}

/// Builder for [`Schema`].
///
/// ```ignore
/// let address = SchemaBuilder::struct_()
///     .name("com.example.Address")
///     .field("street", SchemaBuilder::new(SchemaType::String).build()?)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema_type: SchemaType,
    optional: bool,
    default_value: Option<Value>,
    name: Option<String>,
    version: Option<i32>,
    doc: Option<String>,
    parameters: BTreeMap<String, String>,
    fields: Vec<Field>,
    key_schema: Option<Arc<Schema>>,
    value_schema: Option<Arc<Schema>>,
}

impl SchemaBuilder {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            optional: false,
            default_value: None,
            name: None,
            version: None,
            doc: None,
            parameters: BTreeMap::new(),
            fields: Vec::new(),
            key_schema: None,
            value_schema: None,
        }
    }

    pub fn struct_() -> Self {
        Self::new(SchemaType::Struct)
    }

    pub fn array(value_schema: Arc<Schema>) -> Self {
        let mut builder = Self::new(SchemaType::Array);
        builder.value_schema = Some(value_schema);
        builder
    }

    pub fn map(key_schema: Arc<Schema>, value_schema: Arc<Schema>) -> Self {
        let mut builder = Self::new(SchemaType::Map);
        builder.key_schema = Some(key_schema);
        builder.value_schema = Some(value_schema);
        builder
    }

    pub fn optional(self) -> Self {
        self.set_optional(true)
    }

    pub fn set_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn without_default(mut self) -> Self {
        self.default_value = None;
        self
    }

    /// Append a field; its index is its position.
    pub fn field(mut self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        let index = self.fields.len();
        self.fields.push(Field::new(name, index, schema));
        self
    }

    /// Replace the whole field list. Indices are checked by `build()`.
    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn build(self) -> Result<Arc<Schema>, PluginError> {
        if !self.fields.is_empty() && self.schema_type != SchemaType::Struct {
            return Err(PluginError::schema(format!(
                "{} schema cannot declare fields",
                self.schema_type
            )));
        }
        if self.fields.is_empty() && self.schema_type == SchemaType::Struct {
            return Err(PluginError::schema(format!(
                "struct schema{} must declare at least one field",
                self.name.as_deref().map(|n| format!(" '{n}'")).unwrap_or_default()
            )));
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for (position, field) in self.fields.iter().enumerate() {
            if field.index != position {
                return Err(PluginError::schema(format!(
                    "field '{}' has index {} but sits at position {position}",
                    field.name, field.index
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(PluginError::schema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        match self.schema_type {
            SchemaType::Array if self.key_schema.is_some() || self.value_schema.is_none() => {
                return Err(PluginError::schema(
                    "array schema requires a value schema and no key schema",
                ));
            }
            SchemaType::Map if self.key_schema.is_none() || self.value_schema.is_none() => {
                return Err(PluginError::schema("map schema requires key and value schemas"));
            }
            SchemaType::Array | SchemaType::Map => {}
            other if self.key_schema.is_some() || self.value_schema.is_some() => {
                return Err(PluginError::schema(format!(
                    "{other} schema cannot declare key or value schemas"
                )));
            }
            _ => {}
        }

        let default_value = self.default_value;
        let schema = Schema {
            schema_type: self.schema_type,
            optional: self.optional,
            default_value: None,
            name: self.name,
            version: self.version,
            doc: self.doc,
            parameters: self.parameters,
            fields: self.fields,
            key_schema: self.key_schema,
            value_schema: self.value_schema,
        };

        match default_value {
            Some(default) => {
                schema
                    .validate_value(&default)
                    .map_err(|e| PluginError::schema(format!("invalid default value: {}", e.message)))?;
                Ok(Arc::new(Schema {
                    default_value: Some(default),
                    ..schema
                }))
            }
            None => Ok(Arc::new(schema)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(t: SchemaType) -> Arc<Schema> {
        SchemaBuilder::new(t).build().unwrap()
    }

    #[test]
    fn struct_fields_keep_declaration_order() {
        let schema = SchemaBuilder::struct_()
            .name("Person")
            .field("id", primitive(SchemaType::Int32))
            .field("name", primitive(SchemaType::String))
            .build()
            .unwrap();

        let names: Vec<_> = schema.fields().iter().map(|f| (f.name(), f.index())).collect();
        assert_eq!(names, vec![("id", 0), ("name", 1)]);
        assert_eq!(schema.field("name").unwrap().schema().schema_type(), SchemaType::String);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn duplicate_field_names_rejected() {
        let err = SchemaBuilder::struct_()
            .field("id", primitive(SchemaType::Int32))
            .field("id", primitive(SchemaType::Int64))
            .build()
            .unwrap_err();
        assert!(err.message.contains("duplicate field name 'id'"));
    }

    #[test]
    fn struct_without_fields_rejected() {
        let err = SchemaBuilder::struct_().name("Empty").build().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Schema);
        assert!(err.message.contains("struct schema 'Empty' must declare at least one field"));

        let err = SchemaBuilder::struct_().with_fields(Vec::new()).build().unwrap_err();
        assert!(err.message.contains("at least one field"));
    }

    #[test]
    fn field_index_must_match_position() {
        let err = SchemaBuilder::struct_()
            .with_fields(vec![Field::new("id", 3, primitive(SchemaType::Int32))])
            .build()
            .unwrap_err();
        assert!(err.message.contains("index 3"));
    }

    #[test]
    fn container_sub_schemas_checked() {
        assert!(SchemaBuilder::new(SchemaType::Map).build().is_err());
        assert!(SchemaBuilder::new(SchemaType::Array).build().is_err());
        let arr = SchemaBuilder::array(primitive(SchemaType::String)).build().unwrap();
        assert!(arr.key_schema().is_none());
        assert_eq!(arr.value_schema().unwrap().schema_type(), SchemaType::String);
        assert!(
            SchemaBuilder::new(SchemaType::Int32)
                .field("x", primitive(SchemaType::Int32))
                .build()
                .is_err()
        );
    }

    #[test]
    fn default_value_must_conform() {
        let ok = SchemaBuilder::new(SchemaType::Int32)
            .default_value(Value::Int32(5))
            .build()
            .unwrap();
        assert_eq!(ok.default_value(), Some(&Value::Int32(5)));

        let err = SchemaBuilder::new(SchemaType::Int32)
            .default_value(Value::String("five".into()))
            .build()
            .unwrap_err();
        assert!(err.message.starts_with("invalid default value"));
    }

    #[test]
    fn to_builder_shares_children() {
        let inner = primitive(SchemaType::String);
        let original = SchemaBuilder::struct_()
            .name("Old")
            .doc("docs")
            .version(3)
            .parameter("k", "v")
            .field("a", inner.clone())
            .build()
            .unwrap();

        let renamed = original.to_builder().name("New").build().unwrap();
        assert_eq!(renamed.name(), Some("New"));
        assert_eq!(renamed.doc(), Some("docs"));
        assert_eq!(renamed.version(), Some(3));
        assert_eq!(renamed.parameters().get("k").map(String::as_str), Some("v"));
        assert!(Arc::ptr_eq(renamed.fields()[0].schema(), &inner));
    }

    #[test]
    fn null_allowed_only_for_optional_or_defaulted() {
        let required = primitive(SchemaType::String);
        let optional = SchemaBuilder::new(SchemaType::String).optional().build().unwrap();
        let defaulted = SchemaBuilder::new(SchemaType::String)
            .default_value(Value::from("x"))
            .build()
            .unwrap();
        assert!(required.validate_value(&Value::Null).is_err());
        assert!(optional.validate_value(&Value::Null).is_ok());
        assert!(defaulted.validate_value(&Value::Null).is_ok());
    }

    #[test]
    fn schema_type_names_round_trip() {
        for t in [SchemaType::Int8, SchemaType::Bytes, SchemaType::Map, SchemaType::Struct] {
            assert_eq!(t.as_str().parse::<SchemaType>().unwrap(), t);
        }
        assert!("decimal".parse::<SchemaType>().is_err());
    }
}
