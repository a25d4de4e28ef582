use crate::{error::SchemaError, sql::base::error::DbError};
use async_trait::async_trait;
use model::{
    core::identifiers::TableIdentifier,
    records::{buffer::RowBuffer, row::RowData},
    schema::table::{TableDefinition, TableSchemaDetailLevel},
};
use planner::query::script::Script;

/// An open session or transaction the merge engine issues commands on.
///
/// Implementations never begin, commit or roll back on their own; the
/// caller owns the transaction boundary. Methods take `&self` so several
/// merges may share one session concurrently.
#[async_trait]
pub trait SqlSession: Send + Sync {
    /// Runs a batch that returns no rows.
    async fn execute(&self, script: &Script) -> Result<(), DbError>;

    /// Runs a batch and returns every result set it produced, in order.
    async fn query_result_sets(&self, script: &Script) -> Result<Vec<Vec<RowData>>, DbError>;

    /// Runs a batch and returns the rows of its last result set.
    async fn query_rows(&self, script: &Script) -> Result<Vec<RowData>, DbError> {
        Ok(self.query_result_sets(script).await?.pop().unwrap_or_default())
    }

    /// Writes `rows` into `table` through the driver's native bulk path.
    /// Returns the number of rows written.
    async fn bulk_load(&self, table: &str, rows: &RowBuffer) -> Result<u64, DbError>;
}

/// Where table metadata comes from.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Identifies the connection path this source reads through. Load
    /// failures are remembered per source id.
    fn source_id(&self) -> String;

    async fn load_table_schema(
        &self,
        table: &TableIdentifier,
        detail: TableSchemaDetailLevel,
    ) -> Result<TableDefinition, SchemaError>;
}
