use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// Neither a usable qualifier nor a primary key fallback exists.
    #[error(
        "No valid match qualifiers could be resolved for the target table {table}, and the table does not have a primary key to use as the default match qualifier"
    )]
    NoValidMatchQualifier { table: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
