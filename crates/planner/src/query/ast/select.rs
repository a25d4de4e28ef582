//! Defines the AST for a SELECT query, including the `SELECT ... INTO` form
//! used to create temporary tables.

use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::Expr,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Select {
    /// `TOP(n)` or `TOP(n) PERCENT`.
    pub top: Option<Top>,

    /// The list of columns or expressions to be returned.
    pub columns: Vec<Expr>,

    /// Target of `SELECT ... INTO`.
    pub into: Option<TableRef>,

    pub from: Option<FromClause>,

    pub order_by: Vec<OrderByExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Top {
    Rows(u64),
    Percent(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub table: TableRef,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: Option<OrderDir>,
}
