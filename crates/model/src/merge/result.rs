use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The outcome the server reported for one processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    Deleted,
    NoAction,
}

impl MergeOutcome {
    /// The `$action` tag written by the MERGE OUTPUT clause.
    pub fn tag(&self) -> &'static str {
        match self {
            MergeOutcome::Inserted => "INSERT",
            MergeOutcome::Updated => "UPDATE",
            MergeOutcome::Deleted => "DELETE",
            MergeOutcome::NoAction => "",
        }
    }
}

impl FromStr for MergeOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INSERT" => Ok(MergeOutcome::Inserted),
            "UPDATE" => Ok(MergeOutcome::Updated),
            "DELETE" => Ok(MergeOutcome::Deleted),
            "" => Ok(MergeOutcome::NoAction),
            other => Err(format!("Unknown merge action tag '{other}'")),
        }
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeOutcome::Inserted => "inserted",
            MergeOutcome::Updated => "updated",
            MergeOutcome::Deleted => "deleted",
            MergeOutcome::NoAction => "no_action",
        };
        f.write_str(name)
    }
}

/// One row of the merge OUTPUT, keyed by the position of the input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub row_number: usize,
    pub identity_value: Option<i64>,
    pub action: MergeOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_tags() {
        assert_eq!("INSERT".parse::<MergeOutcome>(), Ok(MergeOutcome::Inserted));
        assert_eq!(" update ".parse::<MergeOutcome>(), Ok(MergeOutcome::Updated));
        assert_eq!("Delete".parse::<MergeOutcome>(), Ok(MergeOutcome::Deleted));
        assert_eq!("".parse::<MergeOutcome>(), Ok(MergeOutcome::NoAction));
        assert!("UPSERT".parse::<MergeOutcome>().is_err());
    }
}
