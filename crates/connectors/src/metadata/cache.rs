use crate::metadata::loader::SchemaLoader;
use lazy_static::lazy_static;
use model::core::connection::ConnectionIdentity;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::debug;

lazy_static! {
    static ref GLOBAL_CACHE: SchemaLoaderCache = SchemaLoaderCache::new();
}

/// Hands out one [`SchemaLoader`] per connection identity.
#[derive(Debug, Default)]
pub struct SchemaLoaderCache {
    loaders: Mutex<HashMap<ConnectionIdentity, Arc<SchemaLoader>>>,
}

impl SchemaLoaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static SchemaLoaderCache {
        &GLOBAL_CACHE
    }

    pub fn get_schema_loader(&self, identity: impl Into<ConnectionIdentity>) -> Arc<SchemaLoader> {
        let identity = identity.into();
        let mut loaders = self.loaders.lock().unwrap_or_else(PoisonError::into_inner);
        loaders
            .entry(identity.clone())
            .or_insert_with(|| {
                debug!("Creating schema loader for {}", identity);
                Arc::new(SchemaLoader::new(identity.clone()))
            })
            .clone()
    }

    /// Drops every loader and everything they cached.
    pub fn clear_cache(&self) {
        let mut loaders = self.loaders.lock().unwrap_or_else(PoisonError::into_inner);
        for loader in loaders.values() {
            loader.clear();
        }
        loaders.clear();
    }

    pub fn count(&self) -> usize {
        self.loaders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
