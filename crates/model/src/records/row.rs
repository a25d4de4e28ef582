use crate::core::value::FieldValue;
use serde::{Deserialize, Serialize};

/// One row returned by a query, with cells addressable by column name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(field_values: Vec<FieldValue>) -> Self {
        RowData { field_values }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn try_get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(|f| f.value.as_i64())
    }

    pub fn try_get_string(&self, field: &str) -> Option<String> {
        self.get(field)
            .filter(|f| !f.value.is_null())
            .and_then(|f| f.value.as_string())
    }

    pub fn try_get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(|f| f.value.as_bool())
    }
}
