//! `nest-fields` transform: wraps selected top-level fields into new
//! single-field structs, keeping schema and value in step.
//!
//! With `fields-to-nest = "street:address"`, a value
//! `{id: 7, street: "Main St", city: "Springfield"}` becomes
//! `{id: 7, address: {street: "Main St"}, city: "Springfield"}`; the schema
//! changes the same way and `address` takes the position `street` had.

use restruct_api::error::PluginError;
use restruct_api::record::Record;
use restruct_api::transform::Transform;
use restruct_api::value::Value;
use restruct_api::ConfigParams;

pub mod mapping;
pub mod rewrite;

pub use mapping::{NestEntry, NestMapping};
pub use rewrite::{nest_fields, Skip};

pub const FIELDS_TO_NEST: &str = "fields-to-nest";

#[derive(Debug, Default, ConfigParams)]
pub struct NestFieldsConfig {
    #[param(
        importance = "high",
        required,
        description = "Comma-separated list of fields to nest in the format fieldName:structName"
    )]
    pub fields_to_nest: String,
}

/// Wraps mapped top-level fields of struct values. Records whose value is not
/// a struct, or that contain none of the mapped fields, pass through.
#[derive(Debug)]
pub struct NestFields {
    mapping: NestMapping,
}

impl NestFields {
    pub fn new(config: NestFieldsConfig) -> Result<Self, PluginError> {
        Ok(Self::from_mapping(config.fields_to_nest.parse()?))
    }

    pub fn from_mapping(mapping: NestMapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &NestMapping {
        &self.mapping
    }
}

impl Transform for NestFields {
    fn apply(&self, record: Record) -> Record {
        let Value::Struct(value) = &record.value else {
            tracing::trace!(topic = %record.topic, kind = record.value.type_name(), "value is not a struct, passing through");
            return record;
        };

        match nest_fields(value, &self.mapping) {
            Ok((schema, nested)) => {
                tracing::trace!(topic = %record.topic, schema = ?schema.name(), "nested fields");
                record.with_value(schema, Value::Struct(nested))
            }
            Err(Skip::NoTargetedFields) => record,
            Err(skip) => {
                tracing::debug!(topic = %record.topic, reason = %skip, "passing record through unchanged");
                record
            }
        }
    }
}

restruct_api::transform_plugin!(
    "nest-fields",
    "Wrap top-level fields into new single-field structs",
    NestFieldsConfig,
    NestFields::new
);
