use serde::{Deserialize, Serialize};
use std::fmt;

/// What a bulk merge call is allowed to do with each incoming row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeAction {
    Insert,
    Update,
    InsertOrUpdate,
}

impl MergeAction {
    pub fn inserts(&self) -> bool {
        matches!(self, MergeAction::Insert | MergeAction::InsertOrUpdate)
    }

    pub fn updates(&self) -> bool {
        matches!(self, MergeAction::Update | MergeAction::InsertOrUpdate)
    }
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeAction::Insert => write!(f, "insert"),
            MergeAction::Update => write!(f, "update"),
            MergeAction::InsertOrUpdate => write!(f, "insert_or_update"),
        }
    }
}
