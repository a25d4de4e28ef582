use crate::{
    core::identifiers::TableIdentifier,
    schema::column::{ColumnDefinition, ForeignKeyConstraint, PrimaryKeyConstraint},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TableSchemaDetailLevel {
    /// Columns, primary key and identity column.
    #[default]
    Basic,
    /// Everything in `Basic` plus foreign key constraints.
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Table {table} has no columns")]
    NoColumns { table: String },

    #[error("Table {table} defines column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("Table {table} has more than one identity column ('{first}', '{second}')")]
    MultipleIdentityColumns {
        table: String,
        first: String,
        second: String,
    },

    #[error("Primary key of {table} references unknown column '{column}'")]
    UnknownKeyColumn { table: String, column: String },
}

/// Immutable schema snapshot of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    table: TableIdentifier,
    columns: Vec<ColumnDefinition>,
    identity_column: Option<usize>,
    primary_key: Option<PrimaryKeyConstraint>,
    foreign_keys: Vec<ForeignKeyConstraint>,
    detail_level: TableSchemaDetailLevel,
}

impl TableDefinition {
    pub fn new(
        table: TableIdentifier,
        mut columns: Vec<ColumnDefinition>,
        primary_key: Option<PrimaryKeyConstraint>,
    ) -> Result<Self, DefinitionError> {
        let table_name = table.fully_qualified().to_string();
        if columns.is_empty() {
            return Err(DefinitionError::NoColumns { table: table_name });
        }

        columns.sort_by_key(|c| c.ordinal_position);

        let mut seen = HashSet::new();
        let mut identity_column: Option<usize> = None;
        for (idx, column) in columns.iter().enumerate() {
            if !seen.insert(column.name.to_lowercase()) {
                return Err(DefinitionError::DuplicateColumn {
                    table: table_name,
                    column: column.name.clone(),
                });
            }
            if column.is_identity {
                if let Some(first) = identity_column {
                    return Err(DefinitionError::MultipleIdentityColumns {
                        table: table_name,
                        first: columns[first].name.clone(),
                        second: column.name.clone(),
                    });
                }
                identity_column = Some(idx);
            }
        }

        if let Some(pk) = &primary_key {
            for key in &pk.key_columns {
                if !seen.contains(&key.column_name.to_lowercase()) {
                    return Err(DefinitionError::UnknownKeyColumn {
                        table: table_name,
                        column: key.column_name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            table,
            columns,
            identity_column,
            primary_key: primary_key.filter(|pk| !pk.key_columns.is_empty()),
            foreign_keys: Vec::new(),
            detail_level: TableSchemaDetailLevel::Basic,
        })
    }

    pub fn with_foreign_keys(mut self, foreign_keys: Vec<ForeignKeyConstraint>) -> Self {
        self.foreign_keys = foreign_keys;
        self.detail_level = TableSchemaDetailLevel::Extended;
        self
    }

    pub fn table(&self) -> &TableIdentifier {
        &self.table
    }

    pub fn fully_qualified_name(&self) -> &str {
        self.table.fully_qualified()
    }

    /// Columns ordered by ordinal position.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn identity_column(&self) -> Option<&ColumnDefinition> {
        self.identity_column.map(|idx| &self.columns[idx])
    }

    pub fn primary_key(&self) -> Option<&PrimaryKeyConstraint> {
        self.primary_key.as_ref()
    }

    pub fn foreign_keys(&self) -> &[ForeignKeyConstraint] {
        &self.foreign_keys
    }

    pub fn detail_level(&self) -> TableSchemaDetailLevel {
        self.detail_level
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Column names in ordinal order, optionally leaving out the identity column.
    pub fn column_names(&self, include_identity: bool) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| include_identity || !c.is_identity)
            .map(|c| c.name.as_str())
            .collect()
    }
}
