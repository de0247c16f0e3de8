use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use restruct_api::error::PluginError;
use restruct_api::schema::{Field, Schema, SchemaBuilder};
use restruct_api::value::{Struct, Value};

use crate::mapping::NestMapping;

/// Why a struct was left as it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Skip {
    /// None of the configured source fields exist in this schema.
    NoTargetedFields,
    /// The rewritten field list would contain this name twice.
    NameCollision(String),
    /// The rebuilt schema or struct refused the input (e.g. a required field
    /// holding null in an incomplete struct).
    Rejected(PluginError),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::NoTargetedFields => f.write_str("no configured field present"),
            Skip::NameCollision(name) => write!(f, "field name '{name}' would appear twice"),
            Skip::Rejected(e) => write!(f, "input rejected: {}", e.message),
        }
    }
}

impl From<PluginError> for Skip {
    fn from(e: PluginError) -> Self {
        Skip::Rejected(e)
    }
}

/// Wrapper for one top-level field, indexed like the original field list.
type Wrappers = Vec<Option<(String, Arc<Schema>)>>;

/// Wrap the mapped top-level fields of `original` into single-field structs.
///
/// Returns the rewritten schema and a struct bound to it. Mapped fields keep
/// their position; every other field keeps its schema object.
pub fn nest_fields(original: &Struct, mapping: &NestMapping) -> Result<(Arc<Schema>, Struct), Skip> {
    let schema = original.schema();
    let wrappers = wrapper_schemas(schema, mapping)?;
    if wrappers.iter().all(Option::is_none) {
        return Err(Skip::NoTargetedFields);
    }

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .zip(&wrappers)
        .map(|(field, wrapper)| match wrapper {
            Some((struct_name, wrapper_schema)) => {
                Field::new(struct_name.clone(), field.index(), wrapper_schema.clone())
            }
            None => field.clone(),
        })
        .collect();

    let mut seen = HashSet::with_capacity(fields.len());
    if let Some(dup) = fields.iter().find(|f| !seen.insert(f.name())) {
        return Err(Skip::NameCollision(dup.name().to_string()));
    }

    let builder = schema.to_builder().with_fields(fields);
    let updated_schema = match schema.default_value() {
        // A struct default is rewritten the same way as the value itself.
        Some(Value::Struct(default)) => {
            let shape = builder.clone().without_default().build()?;
            let nested_default = fill(default, &shape, &wrappers)?;
            builder.default_value(Value::Struct(nested_default)).build()?
        }
        _ => builder.build()?,
    };

    let updated_value = fill(original, &updated_schema, &wrappers)?;
    Ok((updated_schema, updated_value))
}

/// Synthesize `struct_name { field }` schemas for the mapped fields.
///
/// The wrapper only inherits optionality; doc, parameters, version and default
/// stay with the wrapped field's own schema.
fn wrapper_schemas(schema: &Schema, mapping: &NestMapping) -> Result<Wrappers, PluginError> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let Some(struct_name) = mapping.target_for(field.name()) else {
                return Ok(None);
            };
            let wrapper = SchemaBuilder::struct_()
                .name(struct_name)
                .set_optional(field.schema().is_optional())
                .field(field.name(), field.schema().clone())
                .build()?;
            Ok(Some((struct_name.to_string(), wrapper)))
        })
        .collect()
}

/// Copy `original`'s stored values into a struct bound to `target`, wrapping
/// the mapped ones.
fn fill(original: &Struct, target: &Arc<Schema>, wrappers: &Wrappers) -> Result<Struct, PluginError> {
    let mut updated = Struct::new(target.clone())?;
    for ((field, value), wrapper) in original.iter().zip(wrappers) {
        match wrapper {
            Some((struct_name, wrapper_schema)) => {
                let mut inner = Struct::new(wrapper_schema.clone())?;
                inner.put(field.name(), value.clone())?;
                updated.put(struct_name, Value::Struct(inner))?;
            }
            None => {
                updated.put(field.name(), value.clone())?;
            }
        }
    }
    Ok(updated)
}
