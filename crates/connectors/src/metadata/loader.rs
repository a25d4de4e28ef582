use crate::{
    error::{SchemaError, SchemaLoadFailure},
    sql::base::session::SchemaSource,
};
use model::{
    core::{connection::ConnectionIdentity, identifiers::TableIdentifier},
    schema::table::{TableDefinition, TableSchemaDetailLevel},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

type LoadResult = Result<Arc<TableDefinition>, SchemaLoadFailure>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    table: String,
    detail: TableSchemaDetailLevel,
}

impl TableKey {
    fn new(table: &TableIdentifier, detail: TableSchemaDetailLevel) -> Self {
        Self {
            table: table.fully_qualified().to_lowercase(),
            detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LoadKey {
    source_id: String,
    table: TableKey,
}

/// Lazily loads and caches table definitions for one connection identity.
///
/// Concurrent requests for the same table through the same source share a
/// single catalog query. A failed query is remembered for that source and
/// returned again, unchanged, on every later request through it. Successful
/// loads are shared by every source.
#[derive(Debug)]
pub struct SchemaLoader {
    identity: ConnectionIdentity,
    definitions: Mutex<HashMap<TableKey, Arc<TableDefinition>>>,
    loads: Mutex<HashMap<LoadKey, Arc<OnceCell<LoadResult>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SchemaLoader {
    pub fn new(identity: ConnectionIdentity) -> Self {
        Self {
            identity,
            definitions: Mutex::new(HashMap::new()),
            loads: Mutex::new(HashMap::new()),
        }
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub async fn get_table_schema(
        &self,
        source: &dyn SchemaSource,
        table: &TableIdentifier,
        detail: TableSchemaDetailLevel,
    ) -> Result<Arc<TableDefinition>, SchemaError> {
        if let Some(definition) = self.cached(table, detail) {
            debug!("Schema cache hit for {} ({:?})", table, detail);
            return Ok(definition);
        }

        let key = LoadKey {
            source_id: source.source_id(),
            table: TableKey::new(table, detail),
        };
        let cell = lock(&self.loads).entry(key.clone()).or_default().clone();

        let result = cell
            .get_or_try_init(|| async {
                info!(
                    "Loading schema for {} ({:?}) on {}",
                    table, detail, self.identity
                );
                match source.load_table_schema(table, detail).await {
                    Ok(definition) => Ok(Ok(Arc::new(definition))),
                    Err(SchemaError::LoadFailure(failure)) => {
                        warn!("Schema load for {} failed: {}", table, failure);
                        Ok(Err(failure))
                    }
                    // Missing tables and bad metadata are not remembered.
                    Err(other) => Err(other),
                }
            })
            .await?;

        match result {
            Ok(definition) => {
                lock(&self.definitions).insert(key.table.clone(), definition.clone());
                lock(&self.loads).remove(&key);
                Ok(definition.clone())
            }
            Err(failure) => Err(SchemaError::LoadFailure(failure.clone())),
        }
    }

    fn cached(
        &self,
        table: &TableIdentifier,
        detail: TableSchemaDetailLevel,
    ) -> Option<Arc<TableDefinition>> {
        let definitions = lock(&self.definitions);
        definitions
            .get(&TableKey::new(table, detail))
            .or_else(|| match detail {
                // Extended definitions carry everything a basic one does.
                TableSchemaDetailLevel::Basic => definitions.get(&TableKey::new(
                    table,
                    TableSchemaDetailLevel::Extended,
                )),
                TableSchemaDetailLevel::Extended => None,
            })
            .cloned()
    }

    /// Drops everything cached for `table`, including remembered failures.
    pub fn invalidate(&self, table: &TableIdentifier) {
        let name = table.fully_qualified().to_lowercase();
        lock(&self.definitions).retain(|key, _| key.table != name);
        lock(&self.loads).retain(|key, _| key.table.table != name);
        debug!("Invalidated cached schema for {}", table);
    }

    pub fn clear(&self) {
        lock(&self.definitions).clear();
        lock(&self.loads).clear();
    }

    /// Number of cached table definitions.
    pub fn cached_count(&self) -> usize {
        lock(&self.definitions).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::schema::column::ColumnDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        id: &'static str,
        calls: AtomicUsize,
        failure: Option<SchemaLoadFailure>,
    }

    impl CountingSource {
        fn ok(id: &'static str) -> Self {
            Self {
                id,
                calls: AtomicUsize::new(0),
                failure: None,
            }
        }

        fn failing(id: &'static str, message: &str) -> Self {
            Self {
                id,
                calls: AtomicUsize::new(0),
                failure: Some(SchemaLoadFailure {
                    code: Some(4902),
                    message: message.to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl SchemaSource for CountingSource {
        fn source_id(&self) -> String {
            self.id.to_string()
        }

        async fn load_table_schema(
            &self,
            table: &TableIdentifier,
            _detail: TableSchemaDetailLevel,
        ) -> Result<TableDefinition, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if let Some(failure) = &self.failure {
                return Err(SchemaError::LoadFailure(failure.clone()));
            }
            if table.table_name() == "Missing" {
                return Err(SchemaError::TableNotFound(table.to_string()));
            }
            Ok(TableDefinition::new(
                table.clone(),
                vec![ColumnDefinition::new("Id", 1, "int").identity()],
                None,
            )?)
        }
    }

    fn loader() -> SchemaLoader {
        SchemaLoader::new(ConnectionIdentity::from_cache_key("test"))
    }

    fn widgets() -> TableIdentifier {
        TableIdentifier::parse("dbo.Widgets").unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_query() {
        let loader = loader();
        let source = CountingSource::ok("a");
        let table = widgets();

        let (a, b) = tokio::join!(
            loader.get_table_schema(&source, &table, TableSchemaDetailLevel::Basic),
            loader.get_table_schema(&source, &table, TableSchemaDetailLevel::Basic),
        );
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let lower = TableIdentifier::parse("[DBO].[widgets]").unwrap();
        loader
            .get_table_schema(&source, &lower, TableSchemaDetailLevel::Basic)
            .await
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_remembered_per_source() {
        let loader = loader();
        let broken = CountingSource::failing("broken", "Incompatible transaction state");

        let first = loader
            .get_table_schema(&broken, &widgets(), TableSchemaDetailLevel::Basic)
            .await
            .unwrap_err();
        let second = loader
            .get_table_schema(&broken, &widgets(), TableSchemaDetailLevel::Basic)
            .await
            .unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);

        let healthy = CountingSource::ok("healthy");
        assert!(
            loader
                .get_table_schema(&healthy, &widgets(), TableSchemaDetailLevel::Basic)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_not_remembered() {
        let loader = loader();
        let source = CountingSource::ok("a");
        let missing = TableIdentifier::parse("Missing").unwrap();

        for _ in 0..2 {
            let err = loader
                .get_table_schema(&source, &missing, TableSchemaDetailLevel::Basic)
                .await
                .unwrap_err();
            assert!(matches!(err, SchemaError::TableNotFound(_)));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let loader = loader();
        let source = CountingSource::ok("a");

        loader
            .get_table_schema(&source, &widgets(), TableSchemaDetailLevel::Basic)
            .await
            .unwrap();
        loader.invalidate(&widgets());
        assert_eq!(loader.cached_count(), 0);

        loader
            .get_table_schema(&source, &widgets(), TableSchemaDetailLevel::Basic)
            .await
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        loader.clear();
        assert_eq!(loader.cached_count(), 0);
    }
}
