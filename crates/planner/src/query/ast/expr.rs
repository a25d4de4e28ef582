//! Defines the AST for SQL expressions.

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column identifier, e.g., `[Key]` or `[source].[Key]`.
    Identifier(Ident),

    /// Trusted SQL text emitted verbatim, e.g. `-1` or `$action`. Only ever
    /// built from fixed fragments, never from caller input.
    Literal(String),

    /// A binary operation, e.g., `a = b`.
    BinaryOp(Box<BinaryOp>),

    /// `CAST(expr AS type)`
    Cast { expr: Box<Expr>, data_type: String },

    /// An aliased expression, e.g. `-1 AS [Id]`
    Alias { expr: Box<Expr>, alias: String },

    /// `*`
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 'source' in 'source.Key'
    pub name: String,              // e.g., the 'Key' in 'source.Key'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    And,
}

impl Expr {
    pub fn alias(self, alias: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.to_string(),
        }
    }

    pub fn cast(self, data_type: &str) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            data_type: data_type.to_string(),
        }
    }

    pub fn eq(self, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp {
            left: self,
            op: BinaryOperator::Eq,
            right,
        }))
    }

    pub fn and(self, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp {
            left: self,
            op: BinaryOperator::And,
            right,
        }))
    }
}
