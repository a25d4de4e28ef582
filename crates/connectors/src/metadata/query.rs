//! Catalog queries describing a table, and decoding of their rows.

use crate::{
    error::SchemaError,
    sql::base::{error::DbError, session::SqlSession},
};
use model::{
    core::identifiers::TableIdentifier,
    records::row::RowData,
    schema::{
        column::{ColumnDefinition, ForeignKeyConstraint, KeyColumn, PrimaryKeyConstraint},
        table::{TableDefinition, TableSchemaDetailLevel},
    },
};
use planner::query::{
    dialect::{Dialect, SqlServer},
    script::Script,
};
use tracing::debug;

const QUERY_TABLE_METADATA_SQL: &str = include_str!("sql/table_metadata.sql");
const QUERY_FOREIGN_KEYS_SQL: &str = include_str!("sql/foreign_keys.sql");
const SCHEMA_PLACEHOLDER: &str = "{schema}";
const TABLE_PLACEHOLDER: &str = "{table}";

pub const COL_TABLE_SCHEMA: &str = "table_schema";
pub const COL_TABLE_NAME: &str = "table_name";
pub const COL_COLUMN_NAME: &str = "column_name";
pub const COL_ORDINAL_POSITION: &str = "ordinal_position";
pub const COL_DATA_TYPE: &str = "data_type";
pub const COL_IS_NULLABLE: &str = "is_nullable";
pub const COL_CHAR_MAX_LENGTH: &str = "character_maximum_length";
pub const COL_IS_IDENTITY: &str = "is_identity";
pub const COL_PK_CONSTRAINT_NAME: &str = "pk_constraint_name";
pub const COL_PK_ORDINAL_POSITION: &str = "pk_ordinal_position";
pub const COL_CONSTRAINT_NAME: &str = "constraint_name";
pub const COL_REFERENCED_TABLE: &str = "referenced_table";
pub const COL_REFERENCED_COLUMN: &str = "referenced_column";

pub struct TableMetadataQuery;

impl TableMetadataQuery {
    pub fn columns_script(table: &TableIdentifier) -> Script {
        Script::raw(Self::bind(QUERY_TABLE_METADATA_SQL, table))
    }

    pub fn foreign_keys_script(table: &TableIdentifier) -> Script {
        Script::raw(Self::bind(QUERY_FOREIGN_KEYS_SQL, table))
    }

    /// Substitutes the placeholders in a single pass, so text inside a bound
    /// literal is never scanned again.
    fn bind(sql: &str, table: &TableIdentifier) -> String {
        let mut bound = String::with_capacity(sql.len() + 64);
        let mut rest = sql;
        while let Some(start) = rest.find('{') {
            bound.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(SCHEMA_PLACEHOLDER) {
                bound.push_str(&SqlServer.quote_literal(table.schema_name()));
                rest = after;
            } else if let Some(after) = tail.strip_prefix(TABLE_PLACEHOLDER) {
                bound.push_str(&SqlServer.quote_literal(table.table_name()));
                rest = after;
            } else {
                bound.push('{');
                rest = &tail[1..];
            }
        }
        bound.push_str(rest);
        bound
    }

    /// Runs the catalog queries on `session` and assembles the definition.
    pub async fn load<S: SqlSession + ?Sized>(
        session: &S,
        table: &TableIdentifier,
        detail: TableSchemaDetailLevel,
    ) -> Result<TableDefinition, SchemaError> {
        debug!("Querying catalog for {} ({:?})", table, detail);
        let rows = session.query_rows(&Self::columns_script(table)).await?;
        let definition = Self::from_rows(table, &rows)?;

        match detail {
            TableSchemaDetailLevel::Basic => Ok(definition),
            TableSchemaDetailLevel::Extended => {
                let fk_rows = session
                    .query_rows(&Self::foreign_keys_script(definition.table()))
                    .await?;
                Ok(definition.with_foreign_keys(Self::foreign_keys_from_rows(&fk_rows)?))
            }
        }
    }

    /// Builds a definition from one row per column. No rows means the table
    /// does not exist.
    pub fn from_rows(
        table: &TableIdentifier,
        rows: &[RowData],
    ) -> Result<TableDefinition, SchemaError> {
        let Some(first) = rows.first() else {
            return Err(SchemaError::TableNotFound(table.fully_qualified().to_string()));
        };

        // Catalog casing wins over the casing the caller typed.
        let identifier = match (
            first.try_get_string(COL_TABLE_SCHEMA),
            first.try_get_string(COL_TABLE_NAME),
        ) {
            (Some(schema), Some(name)) => TableIdentifier::new(&schema, &name)?,
            _ => table.clone(),
        };

        let mut columns = Vec::with_capacity(rows.len());
        let mut key_columns = Vec::new();
        let mut constraint_name = None;

        for row in rows {
            let column = Self::column_from_row(row)?;
            if let Some(name) = row.try_get_string(COL_PK_CONSTRAINT_NAME) {
                let ordinal_position = match row.try_get_i64(COL_PK_ORDINAL_POSITION) {
                    Some(p) => Self::position(p, COL_PK_ORDINAL_POSITION, &column.name)?,
                    None => column.ordinal_position,
                };
                key_columns.push(KeyColumn {
                    column_name: column.name.clone(),
                    ordinal_position,
                });
                constraint_name.get_or_insert(name);
            }
            columns.push(column);
        }

        let primary_key = constraint_name.map(|constraint_name| PrimaryKeyConstraint {
            constraint_name,
            key_columns,
        });

        Ok(TableDefinition::new(identifier, columns, primary_key)?)
    }

    fn column_from_row(row: &RowData) -> Result<ColumnDefinition, DbError> {
        let name = row
            .try_get_string(COL_COLUMN_NAME)
            .ok_or_else(|| DbError::Decode(format!("missing '{COL_COLUMN_NAME}' in catalog row")))?;
        let ordinal = row
            .try_get_i64(COL_ORDINAL_POSITION)
            .ok_or_else(|| DbError::Decode(format!("missing ordinal position for '{name}'")))?;

        Ok(ColumnDefinition {
            ordinal_position: Self::position(ordinal, COL_ORDINAL_POSITION, &name)?,
            sql_type: row.try_get_string(COL_DATA_TYPE).unwrap_or_default(),
            is_identity: row.try_get_bool(COL_IS_IDENTITY).unwrap_or(false),
            is_nullable: row.try_get_bool(COL_IS_NULLABLE).unwrap_or(true),
            char_max_length: row.try_get_i64(COL_CHAR_MAX_LENGTH),
            name,
        })
    }

    fn position(value: i64, field: &str, column: &str) -> Result<usize, DbError> {
        usize::try_from(value)
            .map_err(|_| DbError::Decode(format!("invalid {field} {value} for '{column}'")))
    }

    pub fn foreign_keys_from_rows(rows: &[RowData]) -> Result<Vec<ForeignKeyConstraint>, DbError> {
        rows.iter()
            .map(|row| {
                let get = |col: &str| {
                    row.try_get_string(col)
                        .ok_or_else(|| DbError::Decode(format!("missing '{col}' in foreign key row")))
                };
                Ok(ForeignKeyConstraint {
                    constraint_name: get(COL_CONSTRAINT_NAME)?,
                    column_name: get(COL_COLUMN_NAME)?,
                    referenced_table: get(COL_REFERENCED_TABLE)?,
                    referenced_column: get(COL_REFERENCED_COLUMN)?,
                })
            })
            .collect()
    }
}
