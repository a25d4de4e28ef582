use crate::{
    error::SchemaError,
    metadata::query::TableMetadataQuery,
    sql::base::{
        error::DbError,
        session::{SchemaSource, SqlSession},
    },
};
use async_trait::async_trait;
use model::{
    core::identifiers::TableIdentifier,
    records::{buffer::RowBuffer, row::RowData},
    schema::table::{TableDefinition, TableSchemaDetailLevel},
};
use planner::query::script::Script;

/// A session that also describes its tables by querying the server catalog.
///
/// Commands pass straight through to the wrapped session; schema requests
/// run the catalog queries on it. `source_id` names the connection path for
/// failure memoization in the schema loader.
pub struct CatalogSession<'a, S: ?Sized> {
    session: &'a S,
    source_id: String,
}

impl<'a, S: SqlSession + ?Sized> CatalogSession<'a, S> {
    pub fn new(session: &'a S, source_id: impl Into<String>) -> Self {
        Self {
            session,
            source_id: source_id.into(),
        }
    }

    pub fn session(&self) -> &'a S {
        self.session
    }
}

#[async_trait]
impl<'a, S: SqlSession + ?Sized> SqlSession for CatalogSession<'a, S> {
    async fn execute(&self, script: &Script) -> Result<(), DbError> {
        self.session.execute(script).await
    }

    async fn query_result_sets(&self, script: &Script) -> Result<Vec<Vec<RowData>>, DbError> {
        self.session.query_result_sets(script).await
    }

    async fn bulk_load(&self, table: &str, rows: &RowBuffer) -> Result<u64, DbError> {
        self.session.bulk_load(table, rows).await
    }
}

#[async_trait]
impl<'a, S: SqlSession + ?Sized> SchemaSource for CatalogSession<'a, S> {
    fn source_id(&self) -> String {
        self.source_id.clone()
    }

    async fn load_table_schema(
        &self,
        table: &TableIdentifier,
        detail: TableSchemaDetailLevel,
    ) -> Result<TableDefinition, SchemaError> {
        TableMetadataQuery::load(self.session, table, detail).await
    }
}
