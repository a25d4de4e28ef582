use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, OrderByExpr, Select, Top},
};

#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    ast: Select,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: Vec<Expr>) -> Self {
        self.ast.columns = columns;
        self
    }

    pub fn top(mut self, top: Top) -> Self {
        self.ast.top = Some(top);
        self
    }

    pub fn into_table(mut self, table: TableRef) -> Self {
        self.ast.into = Some(table);
        self
    }

    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> Self {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(|a| a.to_string()),
        });
        self
    }

    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}
