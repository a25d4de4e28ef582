use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub ordinal_position: usize,
    /// Server type name as reported by the catalog, e.g. `nvarchar` or `int`.
    pub sql_type: String,
    pub is_identity: bool,
    pub is_nullable: bool,
    pub char_max_length: Option<i64>,
}

impl ColumnDefinition {
    pub fn new(name: &str, ordinal_position: usize, sql_type: &str) -> Self {
        Self {
            name: name.to_string(),
            ordinal_position,
            sql_type: sql_type.to_string(),
            is_identity: false,
            is_nullable: true,
            char_max_length: None,
        }
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_max_length(mut self, length: i64) -> Self {
        self.char_max_length = Some(length);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumn {
    pub column_name: String,
    pub ordinal_position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyConstraint {
    pub constraint_name: String,
    pub key_columns: Vec<KeyColumn>,
}

impl PrimaryKeyConstraint {
    /// Key column names ordered by their position within the key.
    pub fn ordered_column_names(&self) -> Vec<String> {
        let mut columns = self.key_columns.clone();
        columns.sort_by_key(|k| k.ordinal_position);
        columns.into_iter().map(|k| k.column_name).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    pub constraint_name: String,
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
}
