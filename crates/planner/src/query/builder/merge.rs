use crate::query::ast::{
    common::TableRef,
    expr::Expr,
    merge::{Merge, MergeAssignment, MergeMatched, MergeNotMatched, MergeOutput, MergeSource},
    select::Select,
};

#[derive(Debug, Clone)]
pub struct MergeBuilder {
    ast: Merge,
}

impl MergeBuilder {
    pub fn new(target: TableRef, source: MergeSource) -> Self {
        Self {
            ast: Merge {
                target,
                target_alias: None,
                source,
                source_alias: None,
                on: Expr::Literal("1 = 1".to_string()),
                when_matched: None,
                when_not_matched: None,
                output: None,
            },
        }
    }

    pub fn using_query(target: TableRef, source: Select) -> Self {
        Self::new(target, MergeSource::Query(Box::new(source)))
    }

    pub fn target_alias(mut self, alias: &str) -> Self {
        self.ast.target_alias = Some(alias.to_string());
        self
    }

    pub fn source_alias(mut self, alias: &str) -> Self {
        self.ast.source_alias = Some(alias.to_string());
        self
    }

    pub fn on(mut self, condition: Expr) -> Self {
        self.ast.on = condition;
        self
    }

    pub fn when_matched_update(mut self, assignments: Vec<MergeAssignment>) -> Self {
        self.ast.when_matched = Some(MergeMatched { assignments });
        self
    }

    pub fn when_not_matched_insert(mut self, columns: Vec<String>, values: Vec<Expr>) -> Self {
        self.ast.when_not_matched = Some(MergeNotMatched { columns, values });
        self
    }

    pub fn output_into(
        mut self,
        columns: Vec<Expr>,
        into: TableRef,
        into_columns: Vec<String>,
    ) -> Self {
        self.ast.output = Some(MergeOutput {
            columns,
            into,
            into_columns,
        });
        self
    }

    pub fn build(self) -> Merge {
        self.ast
    }
}
