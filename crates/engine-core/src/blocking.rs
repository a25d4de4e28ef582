use crate::{
    error::BulkMergeError,
    merge::merger::{BulkMergeResponse, BulkMerger},
};
use connectors::sql::base::session::{SchemaSource, SqlSession};
use model::{
    entity::BulkEntity,
    merge::{action::MergeAction, qualifier::MatchQualifierExpression},
};
use tokio::runtime::{Builder, Runtime};

/// Blocking front end over [`BulkMerger`].
///
/// Owns a current-thread runtime and drives the async path to completion on
/// the calling thread. Must not be used from inside another tokio runtime.
pub struct BlockingBulkMerger {
    inner: BulkMerger,
    runtime: Runtime,
}

impl BlockingBulkMerger {
    pub fn new(inner: BulkMerger) -> Result<Self, BulkMergeError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BulkMergeError::Runtime(e.to_string()))?;
        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &BulkMerger {
        &self.inner
    }

    pub fn bulk_insert<T, S>(
        &self,
        session: &S,
        entities: impl IntoIterator<Item = T>,
        table: Option<&str>,
        qualifier: Option<&MatchQualifierExpression>,
    ) -> Result<Vec<T>, BulkMergeError>
    where
        T: BulkEntity,
        S: SqlSession + SchemaSource,
    {
        self.runtime
            .block_on(self.inner.bulk_insert(session, entities, table, qualifier))
    }

    pub fn bulk_update<T, S>(
        &self,
        session: &S,
        entities: impl IntoIterator<Item = T>,
        table: Option<&str>,
        qualifier: Option<&MatchQualifierExpression>,
    ) -> Result<Vec<T>, BulkMergeError>
    where
        T: BulkEntity,
        S: SqlSession + SchemaSource,
    {
        self.runtime
            .block_on(self.inner.bulk_update(session, entities, table, qualifier))
    }

    pub fn bulk_insert_or_update<T, S>(
        &self,
        session: &S,
        entities: impl IntoIterator<Item = T>,
        table: Option<&str>,
        qualifier: Option<&MatchQualifierExpression>,
    ) -> Result<Vec<T>, BulkMergeError>
    where
        T: BulkEntity,
        S: SqlSession + SchemaSource,
    {
        self.runtime.block_on(
            self.inner
                .bulk_insert_or_update(session, entities, table, qualifier),
        )
    }

    pub fn bulk_merge<T, S>(
        &self,
        action: MergeAction,
        session: &S,
        entities: impl IntoIterator<Item = T>,
        table: Option<&str>,
        qualifier: Option<&MatchQualifierExpression>,
    ) -> Result<BulkMergeResponse<T>, BulkMergeError>
    where
        T: BulkEntity,
        S: SqlSession + SchemaSource,
    {
        self.runtime
            .block_on(self.inner.bulk_merge(action, session, entities, table, qualifier))
    }
}
