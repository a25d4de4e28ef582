//! Defines the AST for SQL MERGE statements.

use crate::query::ast::{common::TableRef, expr::Expr, select::Select};

#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub target: TableRef,
    pub target_alias: Option<String>,
    pub source: MergeSource,
    pub source_alias: Option<String>,
    pub on: Expr,
    pub when_matched: Option<MergeMatched>,
    pub when_not_matched: Option<MergeNotMatched>,
    pub output: Option<MergeOutput>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeSource {
    Table(TableRef),
    Query(Box<Select>),
}

/// `WHEN MATCHED THEN UPDATE SET ...`
#[derive(Debug, Clone, PartialEq)]
pub struct MergeMatched {
    pub assignments: Vec<MergeAssignment>,
}

/// `WHEN NOT MATCHED BY TARGET THEN INSERT (...) VALUES (...)`
#[derive(Debug, Clone, PartialEq)]
pub struct MergeNotMatched {
    pub columns: Vec<String>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeAssignment {
    pub column: String,
    pub value: Expr,
}

/// `OUTPUT <columns> INTO <table> (<into_columns>)`
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    pub columns: Vec<Expr>,
    pub into: TableRef,
    pub into_columns: Vec<String>,
}
