use thiserror::Error;

/// All errors coming from the database/session layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// The server rejected a statement.
    #[error("Server error {code}: {message}")]
    Server { code: i32, message: String },

    /// The session is closed, broken or in a state that cannot run commands.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The native bulk load path failed (constraint violation, type mismatch, ...).
    #[error("Bulk load error: {0}")]
    BulkLoad(String),

    /// A result row could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DbError {
    /// Server error number, when the server reported one.
    pub fn code(&self) -> Option<i32> {
        match self {
            DbError::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}
