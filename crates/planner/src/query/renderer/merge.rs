use crate::query::{
    ast::merge::{Merge, MergeAssignment, MergeMatched, MergeNotMatched, MergeOutput, MergeSource},
    renderer::{Render, Renderer},
};

impl Render for Merge {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("MERGE ");
        r.render_table_ref(&self.target);
        r.render_alias(&self.target_alias);

        r.sql.push_str(" USING ");
        match &self.source {
            MergeSource::Table(table) => r.render_table_ref(table),
            MergeSource::Query(select) => {
                r.sql.push('(');
                select.render(r);
                r.sql.push(')');
            }
        }
        r.render_alias(&self.source_alias);

        r.sql.push_str(" ON ");
        self.on.render(r);

        if let Some(matched) = &self.when_matched {
            r.sql.push(' ');
            matched.render(r);
        }

        if let Some(not_matched) = &self.when_not_matched {
            r.sql.push(' ');
            not_matched.render(r);
        }

        if let Some(output) = &self.output {
            r.sql.push(' ');
            output.render(r);
        }
    }
}

impl Render for MergeMatched {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("WHEN MATCHED THEN UPDATE SET ");
        r.render_comma_separated(&self.assignments);
    }
}

impl Render for MergeNotMatched {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("WHEN NOT MATCHED BY TARGET THEN INSERT (");
        r.render_column_list(&self.columns);
        r.sql.push_str(") VALUES (");
        r.render_comma_separated(&self.values);
        r.sql.push(')');
    }
}

impl Render for MergeAssignment {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str(&r.dialect.quote_identifier(&self.column));
        r.sql.push_str(" = ");
        self.value.render(r);
    }
}

impl Render for MergeOutput {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("OUTPUT ");
        r.render_comma_separated(&self.columns);
        r.sql.push_str(" INTO ");
        r.render_table_ref(&self.into);
        r.sql.push_str(" (");
        r.render_column_list(&self.into_columns);
        r.sql.push(')');
    }
}
