use crate::query::{
    ast::{
        common::OrderDir,
        select::{OrderByExpr, Select, Top},
    },
    renderer::{Render, Renderer},
};

impl Render for Select {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("SELECT ");
        if let Some(top) = &self.top {
            match top {
                Top::Rows(n) => r.sql.push_str(&format!("TOP({n}) ")),
                Top::Percent(p) => r.sql.push_str(&format!("TOP({p}) PERCENT ")),
            }
        }

        r.render_comma_separated(&self.columns);

        if let Some(into) = &self.into {
            r.sql.push_str(" INTO ");
            r.render_table_ref(into);
        }

        if let Some(from) = &self.from {
            r.sql.push_str(" FROM ");
            r.render_table_ref(&from.table);
            r.render_alias(&from.alias);
        }

        if !self.order_by.is_empty() {
            r.sql.push_str(" ORDER BY ");
            r.render_comma_separated(&self.order_by);
        }
    }
}

impl Render for OrderByExpr {
    fn render(&self, r: &mut Renderer) {
        self.expr.render(r);
        match self.direction {
            Some(OrderDir::Asc) => r.sql.push_str(" ASC"),
            Some(OrderDir::Desc) => r.sql.push_str(" DESC"),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::{OrderDir, TableRef},
            expr::Expr,
            select::Top,
        },
        builder::select::SelectBuilder,
        dialect::SqlServer,
        ident, literal,
        renderer::{Render, Renderer},
    };

    #[test]
    fn test_render_select_into_temp_table() {
        let ast = SelectBuilder::new()
            .top(Top::Rows(0))
            .select(vec![
                literal("-1").alias("Id"),
                ident("Key"),
                literal("-1").alias("_ROW_"),
            ])
            .into_table(TableRef::temp("#stage"))
            .from(TableRef::new(Some("dbo"), "Widgets"), None)
            .build();

        let mut renderer = Renderer::new(&SqlServer);
        ast.render(&mut renderer);
        assert_eq!(
            renderer.finish(),
            "SELECT TOP(0) -1 AS [Id], [Key], -1 AS [_ROW_] INTO [#stage] FROM [dbo].[Widgets]"
        );
    }

    #[test]
    fn test_render_ordered_percent_select() {
        let ast = SelectBuilder::new()
            .top(Top::Percent(100))
            .select(vec![Expr::Wildcard])
            .from(TableRef::temp("#stage"), None)
            .order_by(ident("_ROW_"), Some(OrderDir::Asc))
            .build();

        let mut renderer = Renderer::new(&SqlServer);
        ast.render(&mut renderer);
        assert_eq!(
            renderer.finish(),
            "SELECT TOP(100) PERCENT * FROM [#stage] ORDER BY [_ROW_] ASC"
        );
    }
}
