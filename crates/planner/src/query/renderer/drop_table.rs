use crate::query::{
    ast::drop_table::DropTable,
    renderer::{Render, Renderer},
};

impl Render for DropTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("DROP TABLE ");
        if self.if_exists {
            r.sql.push_str("IF EXISTS ");
        }
        r.render_table_ref(&self.table);
    }
}
