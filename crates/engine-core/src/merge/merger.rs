use crate::{
    config::BulkMergeConfig,
    error::{BulkMergeError, MergeStep},
    merge::{
        buffer::build_staging_buffer,
        results::{apply_results, decode_results, take_output_rows},
    },
};
use connectors::{
    metadata::{cache::SchemaLoaderCache, loader::SchemaLoader},
    sql::base::session::{SchemaSource, SqlSession},
};
use model::{
    core::{connection::ConnectionIdentity, identifiers::TableIdentifier},
    entity::BulkEntity,
    merge::{action::MergeAction, qualifier::MatchQualifierExpression, result::MergeResult},
    records::{buffer::RowBuffer, row::RowData},
};
use planner::merge_script::{MergeScriptBuilder, MergeScriptBundle};
use std::{future::Future, sync::Arc};
use tracing::{debug, info, warn};

/// Entities in input order, plus the per-row outcomes the server reported.
#[derive(Debug)]
pub struct BulkMergeResponse<T> {
    pub entities: Vec<T>,
    pub results: Vec<MergeResult>,
}

/// Bulk insert, update and upsert through a caller-owned session.
///
/// Each call stages the rows in a temp table, merges them into the target
/// and reads the identity values the server assigned back onto the
/// entities, in input order. The session's transaction is never committed
/// or rolled back here.
pub struct BulkMerger {
    loader: Arc<SchemaLoader>,
    scripts: MergeScriptBuilder,
    config: BulkMergeConfig,
}

impl BulkMerger {
    pub fn new(loader: Arc<SchemaLoader>, config: BulkMergeConfig) -> Self {
        Self {
            loader,
            scripts: MergeScriptBuilder::default(),
            config,
        }
    }

    /// Uses the process-wide schema cache entry for `identity`.
    pub fn for_connection(identity: impl Into<ConnectionIdentity>, config: BulkMergeConfig) -> Self {
        Self::new(Self::get_schema_loader(identity), config)
    }

    /// The process-wide schema loader for `identity`.
    pub fn get_schema_loader(identity: impl Into<ConnectionIdentity>) -> Arc<SchemaLoader> {
        SchemaLoaderCache::global().get_schema_loader(identity)
    }

    pub fn clear_schema_cache() {
        SchemaLoaderCache::global().clear_cache();
    }

    pub fn loader(&self) -> &Arc<SchemaLoader> {
        &self.loader
    }

    pub fn config(&self) -> &BulkMergeConfig {
        &self.config
    }

    pub async fn bulk_insert<T, S>(
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
        self.bulk_merge(MergeAction::Insert, session, entities, table, qualifier)
            .await
            .map(|response| response.entities)
    }

    pub async fn bulk_update<T, S>(
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
        self.bulk_merge(MergeAction::Update, session, entities, table, qualifier)
            .await
            .map(|response| response.entities)
    }

    pub async fn bulk_insert_or_update<T, S>(
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
        self.bulk_merge(MergeAction::InsertOrUpdate, session, entities, table, qualifier)
            .await
            .map(|response| response.entities)
    }

    pub async fn bulk_merge<T, S>(
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
        let mut entities: Vec<T> = entities.into_iter().collect();
        let processing = T::processing_definition();
        if processing.properties.is_empty() {
            return Err(BulkMergeError::InvalidArgument(
                "entity mapping defines no properties".to_string(),
            ));
        }

        let table_name = table
            .or(processing.mapped_table_name.as_deref())
            .ok_or_else(|| {
                BulkMergeError::InvalidArgument(
                    "no table name was given and the entity maps to none".to_string(),
                )
            })?;
        let identifier = TableIdentifier::parse_with_default(table_name, &self.config.default_schema)?;

        let definition = self
            .timed(MergeStep::LoadSchema, async {
                self.loader
                    .get_table_schema(session, &identifier, self.config.schema_detail)
                    .await
                    .map_err(BulkMergeError::from)
            })
            .await?;

        let bundle = self.scripts.build(&definition, &processing, action, qualifier)?;

        if entities.is_empty() {
            debug!("Nothing to {} into {}", action, definition.fully_qualified_name());
            return Ok(BulkMergeResponse {
                entities,
                results: Vec::new(),
            });
        }

        info!(
            "Starting bulk {} of {} rows into {}",
            action,
            entities.len(),
            definition.fully_qualified_name()
        );

        let buffer = build_staging_buffer(&entities, &processing, &bundle);
        let rows = match self.run_scripts(session, &bundle, &buffer).await {
            Ok(rows) => rows,
            Err(err) => {
                self.cleanup(session, &bundle).await;
                return Err(err);
            }
        };

        let results = decode_results(&rows, bundle.has_identity())?;
        apply_results(
            &mut entities,
            &results,
            bundle.qualifier.throw_if_non_unique,
            definition.fully_qualified_name(),
        )?;

        info!(
            "Bulk {} into {} finished: {} rows in, {} results",
            action,
            definition.fully_qualified_name(),
            entities.len(),
            results.len()
        );

        Ok(BulkMergeResponse { entities, results })
    }

    async fn run_scripts<S: SqlSession>(
        &self,
        session: &S,
        bundle: &MergeScriptBundle,
        buffer: &RowBuffer,
    ) -> Result<Vec<RowData>, BulkMergeError> {
        self.timed(MergeStep::CreateTempTables, async {
            session
                .execute(&bundle.init_script)
                .await
                .map_err(|source| BulkMergeError::ScriptExecution {
                    step: MergeStep::CreateTempTables,
                    source,
                })
        })
        .await?;

        let loaded = self
            .timed(MergeStep::BulkLoad, async {
                session
                    .bulk_load(&bundle.staging_table_name, buffer)
                    .await
                    .map_err(|source| BulkMergeError::BulkLoad {
                        table: bundle.staging_table_name.clone(),
                        source,
                    })
            })
            .await?;
        debug!("Loaded {} rows into {}", loaded, bundle.staging_table_name);

        let result_sets = self
            .timed(MergeStep::Merge, async {
                session
                    .query_result_sets(&bundle.merge_script)
                    .await
                    .map_err(|source| BulkMergeError::ScriptExecution {
                        step: MergeStep::Merge,
                        source,
                    })
            })
            .await?;
        let rows = take_output_rows(result_sets)?;
        debug!("Merge returned {} output rows", rows.len());

        Ok(rows)
    }

    /// Drops the temp tables after a failed step. Errors are logged only.
    async fn cleanup<S: SqlSession>(&self, session: &S, bundle: &MergeScriptBundle) {
        if !self.config.cleanup_on_failure {
            return;
        }

        let result = self
            .timed(MergeStep::Cleanup, async {
                session
                    .execute(&bundle.cleanup_script)
                    .await
                    .map_err(|source| BulkMergeError::ScriptExecution {
                        step: MergeStep::Cleanup,
                        source,
                    })
            })
            .await;

        if let Err(err) = result {
            warn!(
                "Failed to drop temp tables {} and {}: {}",
                bundle.staging_table_name, bundle.output_table_name, err
            );
        }
    }

    async fn timed<F, R>(&self, step: MergeStep, fut: F) -> Result<R, BulkMergeError>
    where
        F: Future<Output = Result<R, BulkMergeError>>,
    {
        match self.config.command_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| BulkMergeError::Timeout { step })?,
            None => fut.await,
        }
    }
}
