use std::sync::Arc;

use crate::schema::Schema;
use crate::value::Value;

/// Transport envelope passed between processing stages.
///
/// Transforms only read and replace `value_schema` / `value`. Every other
/// attribute is opaque and carried over unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub topic: String,
    pub partition: Option<i32>,
    pub key_schema: Option<Arc<Schema>>,
    pub key: Value,
    pub value_schema: Option<Arc<Schema>>,
    /// `Value::Null` when the record has no value (tombstone).
    pub value: Value,
    /// Timestamp in milliseconds.
    pub timestamp: Option<i64>,
}

impl Record {
    pub fn new(
        topic: impl Into<String>,
        partition: Option<i32>,
        value_schema: Option<Arc<Schema>>,
        value: Value,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            key_schema: None,
            key: Value::Null,
            value_schema,
            value,
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key_schema: Option<Arc<Schema>>, key: Value) -> Self {
        self.key_schema = key_schema;
        self.key = key;
        self
    }

    pub fn with_timestamp(mut self, ts_ms: i64) -> Self {
        self.timestamp = Some(ts_ms);
        self
    }

    /// Same record with the value section replaced.
    pub fn with_value(self, value_schema: Arc<Schema>, value: Value) -> Self {
        Self {
            value_schema: Some(value_schema),
            value,
            ..self
        }
    }
}
