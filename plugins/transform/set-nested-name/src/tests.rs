use std::sync::Arc;

use restruct_api::record::Record;
use restruct_api::schema::{Schema, SchemaBuilder, SchemaType};
use restruct_api::transform::Transform;
use restruct_api::value::{Struct, Value};

use super::*;

fn primitive(t: SchemaType) -> Arc<Schema> {
    SchemaBuilder::new(t).build().unwrap()
}

fn details_schema() -> Arc<Schema> {
    SchemaBuilder::struct_()
        .name("Old")
        .version(2)
        .doc("details block")
        .parameter("origin", "legacy")
        .field("a", primitive(SchemaType::Int32))
        .field("b", primitive(SchemaType::String))
        .build()
        .unwrap()
}

fn order_schema(details: Arc<Schema>) -> Arc<Schema> {
    SchemaBuilder::struct_()
        .name("Order")
        .field("id", primitive(SchemaType::Int32))
        .field("details", details)
        .field(
            "note",
            SchemaBuilder::new(SchemaType::String).optional().build().unwrap(),
        )
        .build()
        .unwrap()
}

fn order_record() -> Record {
    let details = details_schema();
    let schema = order_schema(details.clone());
    let inner = Struct::new(details).unwrap().with("a", 1).unwrap().with("b", "two").unwrap();
    let value = Struct::new(schema.clone())
        .unwrap()
        .with("id", 42)
        .unwrap()
        .with("details", inner)
        .unwrap();
    Record::new("orders", Some(1), Some(schema), Value::Struct(value)).with_timestamp(99)
}

fn rename(field: &str, name: &str) -> SetNestedName {
    SetNestedName::new(SetNestedNameConfig {
        nested_field_name: field.to_string(),
        new_schema_name: name.to_string(),
    })
    .unwrap()
}

#[test]
fn renames_nested_schema_only() {
    let input = order_record();
    let original = input.value_schema.clone().unwrap();
    let out = rename("details", "New").apply(input);

    let schema = out.value_schema.as_ref().unwrap();
    assert_eq!(schema.name(), Some("Order"));
    let details = schema.field("details").unwrap();
    assert_eq!(details.index(), 1);
    assert_eq!(details.schema().name(), Some("New"));

    let old_details = original.field("details").unwrap().schema();
    assert_eq!(details.schema().version(), old_details.version());
    assert_eq!(details.schema().doc(), old_details.doc());
    assert_eq!(details.schema().parameters(), old_details.parameters());
    assert_eq!(details.schema().is_optional(), old_details.is_optional());
    assert_eq!(details.schema().fields(), old_details.fields());

    for name in ["id", "note"] {
        assert!(Arc::ptr_eq(
            schema.field(name).unwrap().schema(),
            original.field(name).unwrap().schema()
        ));
    }
}

#[test]
fn nested_value_rebound_with_same_fields() {
    let out = rename("details", "New").apply(order_record());
    let value = out.value.as_struct().unwrap();
    let details = value.get_struct("details").unwrap();

    assert_eq!(details.schema().name(), Some("New"));
    let pairs: Vec<_> = details.iter().map(|(f, v)| (f.name().to_string(), v.clone())).collect();
    assert_eq!(
        pairs,
        vec![
            ("a".to_string(), Value::Int32(1)),
            ("b".to_string(), Value::from("two")),
        ]
    );
    assert_eq!(value.get("id"), Some(&Value::Int32(42)));
    assert!(value.validate().is_ok());
}

#[test]
fn unset_optional_sub_field_stays_unset() {
    let details = SchemaBuilder::struct_()
        .name("Old")
        .field("a", primitive(SchemaType::Int32))
        .field(
            "memo",
            SchemaBuilder::new(SchemaType::String)
                .optional()
                .default_value(Value::from("none"))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let schema = order_schema(details.clone());
    let inner = Struct::new(details).unwrap().with("a", 3).unwrap();
    let value = Struct::new(schema.clone())
        .unwrap()
        .with("id", 1)
        .unwrap()
        .with("details", inner)
        .unwrap();

    let out = rename("details", "New").apply(Record::new("t", None, Some(schema), Value::Struct(value)));
    let details = out.value.as_struct().unwrap().get_struct("details").unwrap();
    assert_eq!(details.schema().name(), Some("New"));
    assert_eq!(details.get("a"), Some(&Value::Int32(3)));
    assert_eq!(details.get_without_default("memo"), Some(&Value::Null));
    assert_eq!(details.get("memo"), Some(&Value::from("none")));
}

#[test]
fn envelope_attributes_pass_through() {
    let input = order_record();
    let out = rename("details", "New").apply(input.clone());
    assert_eq!(out.topic, input.topic);
    assert_eq!(out.partition, input.partition);
    assert_eq!(out.timestamp, input.timestamp);
    assert_eq!(out.key, input.key);
}

#[test]
fn absent_nested_value_stays_absent() {
    let details = details_schema().to_builder().optional().build().unwrap();
    let schema = order_schema(details);
    let value = Struct::new(schema.clone()).unwrap().with("id", 1).unwrap();

    let out = rename("details", "New").apply(Record::new("t", None, Some(schema), Value::Struct(value)));
    let value = out.value.as_struct().unwrap();
    assert_eq!(value.get("details"), Some(&Value::Null));
    let details = out.value_schema.as_ref().unwrap().field("details").unwrap().schema().clone();
    assert_eq!(details.name(), Some("New"));
    assert!(details.is_optional());
}

#[test]
fn missing_field_passes_through() {
    let input = order_record();
    let out = rename("shipping", "New").apply(input.clone());
    assert_eq!(out, input);
}

#[test]
fn non_struct_target_passes_through() {
    let input = order_record();
    let out = rename("note", "New").apply(input.clone());
    assert_eq!(out, input);
    assert!(Arc::ptr_eq(
        out.value_schema.as_ref().unwrap(),
        input.value_schema.as_ref().unwrap()
    ));
}

#[test]
fn non_struct_values_pass_through() {
    let record = Record::new("t", None, Some(primitive(SchemaType::String)), Value::from("raw"));
    assert_eq!(rename("details", "New").apply(record.clone()), record);

    let tombstone = Record::new("t", Some(0), None, Value::Null);
    assert_eq!(rename("details", "New").apply(tombstone.clone()), tombstone);
}

#[test]
fn nested_default_follows_rename() {
    let base = details_schema();
    let default = Struct::new(base.clone()).unwrap().with("a", 0).unwrap().with("b", "").unwrap();
    let details = base.to_builder().default_value(Value::Struct(default)).build().unwrap();
    let schema = order_schema(details);
    let value = Struct::new(schema.clone()).unwrap().with("id", 5).unwrap();

    let out = rename("details", "New").apply(Record::new("t", None, Some(schema), Value::Struct(value)));
    let details = out.value_schema.as_ref().unwrap().field("details").unwrap().schema().clone();
    assert_eq!(details.name(), Some("New"));
    let Some(Value::Struct(default)) = details.default_value() else {
        panic!("default lost");
    };
    assert_eq!(default.get("a"), Some(&Value::Int32(0)));

    // Unset value resolves to the rebound default.
    let value = out.value.as_struct().unwrap();
    assert_eq!(value.get_without_default("details"), Some(&Value::Null));
    assert_eq!(value.get("details"), Some(&Value::Struct(default.clone())));
}

#[test]
fn renaming_to_same_name_is_identity_on_content() {
    let input = order_record();
    let out = rename("details", "Old").apply(input.clone());
    assert_eq!(out, input);
}

#[test]
fn configure_through_plugin() {
    let transform = PLUGIN
        .configure([(NESTED_FIELD_NAME, "details"), (NEW_SCHEMA_NAME, "com.example.Details")])
        .unwrap();
    let out = transform.apply(order_record());
    assert_eq!(
        out.value_schema.unwrap().field("details").unwrap().schema().name(),
        Some("com.example.Details")
    );
}

#[test]
fn configuration_errors_name_the_option() {
    let err = PLUGIN.configure([(NESTED_FIELD_NAME, "details")]).err().unwrap();
    assert!(err.is_config());
    assert_eq!(err.option.as_deref(), Some(NEW_SCHEMA_NAME));

    let err = PLUGIN
        .configure([(NESTED_FIELD_NAME, "  "), (NEW_SCHEMA_NAME, "New")])
        .err().unwrap();
    assert_eq!(err.option.as_deref(), Some(NESTED_FIELD_NAME));
    assert!(err.message.contains("must not be empty"));
}

#[test]
fn describe_config_lists_both_options() {
    let names: Vec<_> = PLUGIN
        .describe_config()
        .into_iter()
        .map(|p| (p.name, p.required))
        .collect();
    assert_eq!(
        names,
        vec![
            (NESTED_FIELD_NAME.to_string(), true),
            (NEW_SCHEMA_NAME.to_string(), true),
        ]
    );
}
