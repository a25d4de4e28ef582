use crate::sql::base::error::DbError;
use model::{core::identifiers::IdentifierError, schema::table::DefinitionError};
use thiserror::Error;

/// A failed metadata query. Kept by the schema loader and handed back
/// unchanged on every later request through the same connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SchemaLoadFailure {
    pub code: Option<i32>,
    pub message: String,
}

impl From<DbError> for SchemaLoadFailure {
    fn from(err: DbError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Table {0} was not found")]
    TableNotFound(String),

    #[error("Failed to load table schema: {0}")]
    LoadFailure(#[from] SchemaLoadFailure),

    #[error("Invalid table definition: {0}")]
    InvalidDefinition(#[from] DefinitionError),

    #[error("Invalid table name: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
}

impl From<DbError> for SchemaError {
    fn from(err: DbError) -> Self {
        SchemaError::LoadFailure(err.into())
    }
}
