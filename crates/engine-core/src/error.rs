use connectors::{error::SchemaError, sql::base::error::DbError};
use model::core::identifiers::IdentifierError;
use planner::error::PlannerError;
use std::fmt;
use thiserror::Error;

/// The I/O steps of one bulk merge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    LoadSchema,
    CreateTempTables,
    BulkLoad,
    Merge,
    Cleanup,
}

impl fmt::Display for MergeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStep::LoadSchema => write!(f, "schema load"),
            MergeStep::CreateTempTables => write!(f, "temp table creation"),
            MergeStep::BulkLoad => write!(f, "bulk load"),
            MergeStep::Merge => write!(f, "merge"),
            MergeStep::Cleanup => write!(f, "cleanup"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BulkMergeError {
    /// Malformed table name, missing table reference or an empty entity mapping.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "No valid match qualifiers could be resolved for the target table {table}, and the table does not have a primary key to use as the default match qualifier"
    )]
    NoValidMatchQualifier { table: String },

    #[error("Schema load failed: {0}")]
    SchemaLoad(#[from] SchemaError),

    #[error("{step} failed: {source}")]
    ScriptExecution {
        step: MergeStep,
        #[source]
        source: DbError,
    },

    /// The merge ran but its output cannot be trusted (unknown action tag,
    /// row number out of range, missing column).
    #[error("Merge output was not usable: {0}")]
    InvalidMergeOutput(String),

    #[error("Bulk load into {table} failed: {source}")]
    BulkLoad {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("{step} timed out")]
    Timeout { step: MergeStep },

    #[error("Input row {row_number} matched more than one row in {table}")]
    NonUniqueMatch { row_number: usize, table: String },

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<IdentifierError> for BulkMergeError {
    fn from(err: IdentifierError) -> Self {
        BulkMergeError::InvalidArgument(err.to_string())
    }
}

impl From<PlannerError> for BulkMergeError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::NoValidMatchQualifier { table } => {
                BulkMergeError::NoValidMatchQualifier { table }
            }
            PlannerError::InvalidArgument(msg) => BulkMergeError::InvalidArgument(msg),
        }
    }
}
