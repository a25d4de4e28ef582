//! Defines common, reusable AST nodes for building SQL queries.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        Self {
            schema: schema.map(|s| s.to_string()),
            name: name.to_string(),
        }
    }

    /// A session-scoped temporary object, e.g. `#staging`.
    pub fn temp(name: &str) -> Self {
        Self::new(None, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
