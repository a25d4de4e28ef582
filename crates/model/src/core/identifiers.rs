use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const DEFAULT_SCHEMA_NAME: &str = "dbo";
pub const TERM_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Invalid table name '{raw}': the {part} name is empty")]
    EmptyPart { raw: String, part: &'static str },

    #[error("Invalid table name '{0}': expected 'table' or 'schema.table'")]
    TooManyParts(String),
}

/// A validated `schema.table` reference.
///
/// Both parts are stored trimmed and stripped of `[]`/`""` decoration. Equality
/// is exact; case folding depends on the server collation and is left to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    schema_name: String,
    table_name: String,
    fully_qualified: String,
}

impl TableIdentifier {
    pub fn new(schema_name: &str, table_name: &str) -> Result<Self, IdentifierError> {
        let raw = format!("{schema_name}{TERM_SEPARATOR}{table_name}");
        let schema_name = non_empty(sanitize_term(schema_name), &raw, "schema")?;
        let table_name = non_empty(sanitize_term(table_name), &raw, "table")?;
        let fully_qualified = format!("[{schema_name}].[{table_name}]");

        Ok(Self {
            schema_name,
            table_name,
            fully_qualified,
        })
    }

    /// Parses `table` or `schema.table`, defaulting the schema to `dbo`.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        Self::parse_with_default(raw, DEFAULT_SCHEMA_NAME)
    }

    pub fn parse_with_default(raw: &str, default_schema: &str) -> Result<Self, IdentifierError> {
        let parts = split_terms(raw);
        match parts.as_slice() {
            [table] => {
                let table = non_empty(sanitize_term(table), raw, "table")?;
                Self::new(default_schema, &table)
            }
            [schema, table] => {
                let schema = non_empty(sanitize_term(schema), raw, "schema")?;
                let table = non_empty(sanitize_term(table), raw, "table")?;
                Self::new(&schema, &table)
            }
            _ => Err(IdentifierError::TooManyParts(raw.to_string())),
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// `[schema].[table]`
    pub fn fully_qualified(&self) -> &str {
        &self.fully_qualified
    }

    pub fn switch_schema(&self, new_schema: &str) -> Result<Self, IdentifierError> {
        Self::new(new_schema, &self.table_name)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified)
    }
}

impl FromStr for TableIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Trims whitespace and any `[..]` / `".."` decoration from a single term.
pub fn sanitize_term(term: &str) -> String {
    let mut current = term.trim();
    loop {
        let stripped = current
            .strip_prefix('[')
            .or_else(|| current.strip_prefix('"'))
            .unwrap_or(current);
        let stripped = stripped
            .strip_suffix(']')
            .or_else(|| stripped.strip_suffix('"'))
            .unwrap_or(stripped)
            .trim();

        if stripped.len() == current.len() {
            return stripped.to_string();
        }
        current = stripped;
    }
}

// Splits on separators that sit outside of bracket or quote decoration.
fn split_terms(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut in_quotes = false;

    for (i, ch) in raw.char_indices() {
        match ch {
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            '"' if !in_brackets => in_quotes = !in_quotes,
            TERM_SEPARATOR if !in_brackets && !in_quotes => {
                parts.push(&raw[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn non_empty(value: String, raw: &str, part: &'static str) -> Result<String, IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::EmptyPart {
            raw: raw.to_string(),
            part,
        });
    }
    Ok(value)
}
