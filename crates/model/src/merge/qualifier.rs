use crate::core::identifiers::sanitize_term;
use serde::{Deserialize, Serialize};

/// A column used to match incoming rows against existing target rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchQualifierField {
    sanitized_name: String,
}

impl MatchQualifierField {
    pub fn new(name: &str) -> Self {
        Self {
            sanitized_name: sanitize_term(name),
        }
    }

    pub fn sanitized_name(&self) -> &str {
        &self.sanitized_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQualifierExpression {
    fields: Vec<MatchQualifierField>,
    /// Fail the call when one input row matches more than one target row.
    pub throw_if_non_unique: bool,
}

impl MatchQualifierExpression {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_fields(
            field_names
                .into_iter()
                .map(|name| MatchQualifierField::new(name.as_ref()))
                .collect(),
        )
    }

    pub fn from_fields(fields: Vec<MatchQualifierField>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .filter(|f| !f.sanitized_name.is_empty())
                .collect(),
            throw_if_non_unique: false,
        }
    }

    pub fn with_unique_match_check(mut self, enabled: bool) -> Self {
        self.throw_if_non_unique = enabled;
        self
    }

    pub fn fields(&self) -> &[MatchQualifierField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.sanitized_name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_sanitized() {
        let expr = MatchQualifierExpression::new(["[Key]", " Value ", "  "]);
        assert_eq!(expr.field_names(), vec!["Key", "Value"]);
        assert!(!expr.throw_if_non_unique);
    }

    #[test]
    fn test_unique_match_flag() {
        let expr = MatchQualifierExpression::new(["Key"]).with_unique_match_check(true);
        assert!(expr.throw_if_non_unique);
    }
}
