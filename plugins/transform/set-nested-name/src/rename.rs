use std::fmt;
use std::sync::Arc;

use restruct_api::error::PluginError;
use restruct_api::schema::{Field, Schema, SchemaBuilder, SchemaType};
use restruct_api::value::{Struct, Value};

/// Why a struct was left as it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Skip {
    FieldMissing,
    /// The target field exists but its schema has this type.
    NotAStruct(SchemaType),
    Rejected(PluginError),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::FieldMissing => f.write_str("target field not present"),
            Skip::NotAStruct(t) => write!(f, "target field is {t}, not struct"),
            Skip::Rejected(e) => write!(f, "input rejected: {}", e.message),
        }
    }
}

impl From<PluginError> for Skip {
    fn from(e: PluginError) -> Self {
        Skip::Rejected(e)
    }
}

/// Give the struct schema of top-level field `target` the type name `new_name`.
///
/// Only that field's schema changes; sibling fields keep their schema objects
/// and the nested struct keeps its fields, order and values.
pub fn rename_nested(
    original: &Struct,
    target: &str,
    new_name: &str,
) -> Result<(Arc<Schema>, Struct), Skip> {
    let schema = original.schema();
    let field = schema.field(target).ok_or(Skip::FieldMissing)?;
    let nested_type = field.schema().schema_type();
    if nested_type != SchemaType::Struct {
        return Err(Skip::NotAStruct(nested_type));
    }

    let updated_nested = rebuild_with_default(
        field.schema().to_builder().name(new_name),
        field.schema().default_value(),
        copy_by_name,
    )?;

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| {
            if f.name() == target {
                Field::new(target, f.index(), updated_nested.clone())
            } else {
                f.clone()
            }
        })
        .collect();

    let updated_schema = rebuild_with_default(
        schema.to_builder().with_fields(fields),
        schema.default_value(),
        |default, shape| fill(default, shape, target, &updated_nested),
    )?;

    let updated_value = fill(original, &updated_schema, target, &updated_nested)?;
    Ok((updated_schema, updated_value))
}

/// Build a schema from `builder`. A struct `default` is rebound to the new
/// shape with `rebind` first, since the stale one no longer conforms.
fn rebuild_with_default<F>(
    builder: SchemaBuilder,
    default: Option<&Value>,
    rebind: F,
) -> Result<Arc<Schema>, Skip>
where
    F: FnOnce(&Struct, &Arc<Schema>) -> Result<Struct, Skip>,
{
    match default {
        Some(Value::Struct(default)) => {
            let shape = builder.clone().without_default().build()?;
            let rebound = rebind(default, &shape)?;
            Ok(builder.default_value(Value::Struct(rebound)).build()?)
        }
        _ => Ok(builder.build()?),
    }
}

/// Top-level struct bound to `updated_schema`, with the target value rebound
/// to `updated_nested`.
fn fill(
    original: &Struct,
    updated_schema: &Arc<Schema>,
    target: &str,
    updated_nested: &Arc<Schema>,
) -> Result<Struct, Skip> {
    let mut updated = Struct::new(updated_schema.clone())?;
    for (field, value) in original.iter() {
        let value = if field.name() == target {
            match value {
                Value::Null => Value::Null,
                Value::Struct(nested) => Value::Struct(copy_by_name(nested, updated_nested)?),
                other => {
                    return Err(Skip::Rejected(PluginError::data(format!(
                        "field '{target}' holds a {} value",
                        other.type_name()
                    ))));
                }
            }
        } else {
            value.clone()
        };
        updated.put(field.name(), value)?;
    }
    Ok(updated)
}

/// Copy the stored sub-field values by name into a struct bound to `schema`.
///
/// `nested` is bound to a schema with the same field list as `schema`, so
/// every name resolves; unset sub-fields stay unset.
fn copy_by_name(nested: &Struct, schema: &Arc<Schema>) -> Result<Struct, Skip> {
    let mut rebound = Struct::new(schema.clone())?;
    for (sub, value) in nested.iter() {
        rebound.put(sub.name(), value.clone())?;
    }
    Ok(rebound)
}
