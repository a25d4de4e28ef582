//! Defines the `Dialect` trait for database-specific SQL syntax.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// delimiters for the dialect.
    ///
    /// - SQL Server uses brackets: `[my_column]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Renders the qualifier in front of a column reference. Pseudo tables
    /// such as `INSERTED` are emitted bare.
    fn quote_qualifier(&self, qualifier: &str) -> String {
        self.quote_identifier(qualifier)
    }

    /// Renders a string literal.
    fn quote_literal(&self, value: &str) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct SqlServer;

const PSEUDO_TABLES: [&str; 2] = ["INSERTED", "DELETED"];

impl Dialect for SqlServer {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn quote_qualifier(&self, qualifier: &str) -> String {
        if PSEUDO_TABLES
            .iter()
            .any(|p| p.eq_ignore_ascii_case(qualifier))
        {
            qualifier.to_uppercase()
        } else {
            self.quote_identifier(qualifier)
        }
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("N'{}'", value.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_closing_bracket() {
        assert_eq!(SqlServer.quote_identifier("Widgets"), "[Widgets]");
        assert_eq!(SqlServer.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_quote_qualifier_keeps_pseudo_tables_bare() {
        assert_eq!(SqlServer.quote_qualifier("inserted"), "INSERTED");
        assert_eq!(SqlServer.quote_qualifier("source"), "[source]");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(SqlServer.quote_literal("O'Brien"), "N'O''Brien'");
    }
}
