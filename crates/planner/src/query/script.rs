//! A batch of statements sent to the server in one round trip.

use crate::query::{
    ast::{drop_table::DropTable, merge::Merge, select::Select},
    dialect::Dialect,
    renderer::{Render, Renderer},
};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Merge(Merge),
    DropTable(DropTable),
}

impl Render for Statement {
    fn render(&self, r: &mut Renderer) {
        match self {
            Statement::Select(select) => select.render(r),
            Statement::Merge(merge) => merge.render(r),
            Statement::DropTable(drop) => drop.render(r),
        }
    }
}

/// Rendered SQL together with the statements it was rendered from.
///
/// Drivers only need `sql`; the statement list lets in-process sessions
/// execute a batch without parsing SQL text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    sql: String,
    statements: Vec<Statement>,
}

impl Script {
    pub fn new(statements: Vec<Statement>, dialect: &dyn Dialect) -> Self {
        let mut renderer = Renderer::new(dialect);
        for (i, statement) in statements.iter().enumerate() {
            if i > 0 {
                renderer.sql.push('\n');
            }
            statement.render(&mut renderer);
            renderer.sql.push(';');
        }

        Self {
            sql: renderer.finish(),
            statements,
        }
    }

    /// Hand-written SQL with no statement tree, e.g. catalog queries.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            statements: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
