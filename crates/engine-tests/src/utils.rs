#![allow(dead_code)]

use crate::memory::{MemoryDatabase, MemorySession};
use connectors::metadata::loader::SchemaLoader;
use engine_core::{config::BulkMergeConfig, merge::merger::BulkMerger};
use model::{
    core::{connection::ConnectionIdentity, identifiers::TableIdentifier, value::FieldValue},
    entity::{BulkEntity, ProcessingDefinition, PropertyDefinition},
    schema::{
        column::{ColumnDefinition, KeyColumn, PrimaryKeyConstraint},
        table::TableDefinition,
    },
};
use std::sync::Arc;

pub const WIDGETS_TABLE: &str = "dbo.Widgets";
pub const TAGS_TABLE: &str = "dbo.Tags";

/// `dbo.Widgets(Id int identity primary key, Key nvarchar, Value nvarchar)`
pub fn widgets_table() -> TableDefinition {
    TableDefinition::new(
        TableIdentifier::parse(WIDGETS_TABLE).expect("widgets identifier"),
        vec![
            ColumnDefinition::new("Id", 1, "int").identity(),
            ColumnDefinition::new("Key", 2, "nvarchar").with_max_length(50),
            ColumnDefinition::new("Value", 3, "nvarchar").with_max_length(200),
        ],
        Some(PrimaryKeyConstraint {
            constraint_name: "PK_Widgets".into(),
            key_columns: vec![KeyColumn {
                column_name: "Id".into(),
                ordinal_position: 1,
            }],
        }),
    )
    .expect("widgets definition")
}

/// `dbo.Tags(Code nvarchar, Label nvarchar)`: no identity, no primary key.
pub fn tags_table() -> TableDefinition {
    TableDefinition::new(
        TableIdentifier::parse(TAGS_TABLE).expect("tags identifier"),
        vec![
            ColumnDefinition::new("Code", 1, "nvarchar").not_null(),
            ColumnDefinition::new("Label", 2, "nvarchar"),
        ],
        None,
    )
    .expect("tags definition")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: i64,
    pub key: String,
    pub value: String,
}

impl Widget {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            id: 0,
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl BulkEntity for Widget {
    fn processing_definition() -> ProcessingDefinition {
        ProcessingDefinition::new(vec![
            PropertyDefinition::new("id").mapped_to("Id").identity(),
            PropertyDefinition::new("key").mapped_to("Key"),
            PropertyDefinition::new("value").mapped_to("Value"),
        ])
        .with_table(WIDGETS_TABLE)
    }

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::new("id", self.id),
            FieldValue::new("key", self.key.as_str()),
            FieldValue::new("value", self.value.as_str()),
        ]
    }

    fn set_identity(&mut self, value: i64) {
        self.id = value;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub code: String,
    pub label: String,
}

impl Tag {
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
        }
    }
}

impl BulkEntity for Tag {
    fn processing_definition() -> ProcessingDefinition {
        ProcessingDefinition::new(vec![
            PropertyDefinition::new("code").mapped_to("Code"),
            PropertyDefinition::new("label").mapped_to("Label"),
        ])
        .with_table(TAGS_TABLE)
    }

    fn field_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::new("code", self.code.as_str()),
            FieldValue::new("label", self.label.as_str()),
        ]
    }

    fn set_identity(&mut self, _value: i64) {}
}

/// A fresh database holding the widgets and tags tables.
pub fn seeded_database() -> Arc<MemoryDatabase> {
    let db = MemoryDatabase::new();
    db.create_table(widgets_table());
    db.create_table(tags_table());
    db
}

pub fn session(db: &Arc<MemoryDatabase>) -> MemorySession {
    MemorySession::new(db.clone(), "primary")
}

/// A merger with its own schema loader, isolated from the global cache.
pub fn merger(config: BulkMergeConfig) -> BulkMerger {
    BulkMerger::new(
        Arc::new(SchemaLoader::new(ConnectionIdentity::from_cache_key(
            "engine-tests",
        ))),
        config,
    )
}

pub fn widgets(keys: &[&str]) -> Vec<Widget> {
    keys.iter()
        .map(|key| Widget::new(key, &format!("value of {key}")))
        .collect()
}
