//! `set-nested-name` transform: replaces the type name of one nested struct
//! schema and rebinds the nested value to it.

use restruct_api::error::PluginError;
use restruct_api::record::Record;
use restruct_api::transform::Transform;
use restruct_api::value::Value;
use restruct_api::ConfigParams;

pub mod rename;

pub use rename::{rename_nested, Skip};

pub const NESTED_FIELD_NAME: &str = "nested-field-name";
pub const NEW_SCHEMA_NAME: &str = "new-schema-name";

#[derive(Debug, Default, ConfigParams)]
pub struct SetNestedNameConfig {
    #[param(
        importance = "high",
        required,
        description = "Field name of the nested schema to modify"
    )]
    pub nested_field_name: String,

    #[param(
        importance = "high",
        required,
        description = "New schema name for the nested struct"
    )]
    pub new_schema_name: String,
}

#[derive(Debug)]
pub struct SetNestedName {
    nested_field_name: String,
    new_schema_name: String,
}

impl SetNestedName {
    pub fn new(config: SetNestedNameConfig) -> Result<Self, PluginError> {
        for (option, value) in [
            (NESTED_FIELD_NAME, &config.nested_field_name),
            (NEW_SCHEMA_NAME, &config.new_schema_name),
        ] {
            if value.trim().is_empty() {
                return Err(PluginError::invalid_option(option, "must not be empty"));
            }
        }
        Ok(Self {
            nested_field_name: config.nested_field_name,
            new_schema_name: config.new_schema_name,
        })
    }

    pub fn nested_field_name(&self) -> &str {
        &self.nested_field_name
    }

    pub fn new_schema_name(&self) -> &str {
        &self.new_schema_name
    }
}

impl Transform for SetNestedName {
    fn apply(&self, record: Record) -> Record {
        let Value::Struct(value) = &record.value else {
            tracing::trace!(topic = %record.topic, kind = record.value.type_name(), "value is not a struct, passing through");
            return record;
        };

        match rename_nested(value, &self.nested_field_name, &self.new_schema_name) {
            Ok((schema, renamed)) => {
                tracing::trace!(
                    topic = %record.topic,
                    field = %self.nested_field_name,
                    name = %self.new_schema_name,
                    "renamed nested schema"
                );
                record.with_value(schema, Value::Struct(renamed))
            }
            Err(skip) => {
                tracing::debug!(
                    topic = %record.topic,
                    field = %self.nested_field_name,
                    reason = %skip,
                    "passing record through unchanged"
                );
                record
            }
        }
    }
}

restruct_api::transform_plugin!(
    "set-nested-name",
    "Rename the schema of a nested struct field",
    SetNestedNameConfig,
    SetNestedName::new
);

#[cfg(test)]
mod tests;
